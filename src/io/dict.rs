//! Name dictionary codec.
//!
//! Every group of named blocks (folders, bones, materials, animated
//! materials, ...) is indexed by a radix tree stored as a flat node array:
//!
//! ```text
//! u32 total size
//! u32 entry count N
//! N + 1 nodes of 16 bytes:
//!     u16 id      bit position tested at this node
//!     u16 flag    unused, zero
//!     u16 left    node index taken when the bit is 0
//!     u16 right   node index taken when the bit is 1
//!     s32 name    offset to the pooled name, relative to the dictionary
//!     s32 data    offset to the block, relative to the dictionary
//! ```
//!
//! Node 0 is the root sentinel (id `0xFFFF`, no name, no data). Bit ids are
//! `byte_index << 3 | bit` with bytes counted from the start of the name, and
//! a walk always moves to strictly smaller ids until it follows a back edge.

use super::names::NameTable;
use super::reader::{Reader, Region};
use super::writer::Writer;
use crate::util::{Error, Result};

/// Size of the dictionary header.
pub const DICT_HEADER_SIZE: u32 = 8;
/// Size of one node.
pub const DICT_NODE_SIZE: u32 = 16;
/// Id of the root sentinel node.
pub const ROOT_ID: u16 = 0xFFFF;

/// Encoded size of a dictionary with `n` entries. Independent of the names,
/// so block layout can be computed before any name is placed.
#[inline]
pub const fn calc_dictionary_size(n: usize) -> u32 {
    DICT_HEADER_SIZE + DICT_NODE_SIZE * (n as u32 + 1)
}

/// One dictionary node. `data` is an absolute address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictNode {
    pub id: u16,
    pub left: u16,
    pub right: u16,
    pub name: String,
    pub data: u32,
}

impl DictNode {
    fn root() -> Self {
        Self { id: ROOT_ID, left: 0, right: 0, name: String::new(), data: 0 }
    }
}

/// Value of bit `id` of `name`; bits past the end read as zero.
#[inline]
fn name_bit(name: &[u8], id: u16) -> bool {
    let byte = (id >> 3) as usize;
    byte < name.len() && (name[byte] >> (id & 7)) & 1 != 0
}

/// Highest bit id at which two names differ, or `None` if they are equal.
fn calc_id(a: &[u8], b: &[u8]) -> Option<u32> {
    let len = a.len().max(b.len());
    (0..len).rev().find_map(|i| {
        let x = a.get(i).copied().unwrap_or(0) ^ b.get(i).copied().unwrap_or(0);
        (x != 0).then(|| ((i as u32) << 3) | (7 - x.leading_zeros()))
    })
}

/// Decoded or constructed dictionary. `nodes[0]` is the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    nodes: Vec<DictNode>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self { nodes: vec![DictNode::root()] }
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the lookup tree for `entries`, inserted in order.
    pub fn from_entries<S: Into<String>>(entries: impl IntoIterator<Item = (S, u32)>) -> Result<Self> {
        let mut dict = Self::new();
        for (name, data) in entries {
            dict.insert(name.into(), data)?;
        }
        Ok(dict)
    }

    /// Number of entries, excluding the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in array order, which is insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.nodes[1..].iter().map(|n| (n.name.as_str(), n.data))
    }

    /// All nodes including the root.
    pub fn nodes(&self) -> &[DictNode] {
        &self.nodes
    }

    /// Walk the tree for `name` the way the runtime does.
    pub fn find(&self, name: &str) -> Option<&DictNode> {
        let node = &self.nodes[self.walk(name.as_bytes())];
        (!node.name.is_empty() && node.name == name).then_some(node)
    }

    fn walk(&self, name: &[u8]) -> usize {
        let mut prev = 0usize;
        let mut cur = self.nodes[0].left as usize;
        while self.nodes[cur].id < self.nodes[prev].id {
            prev = cur;
            let node = &self.nodes[cur];
            cur = if name_bit(name, node.id) { node.right } else { node.left } as usize;
        }
        cur
    }

    fn insert(&mut self, name: String, data: u32) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid("dictionary entries need a name"));
        }
        let key = name.as_bytes();
        let candidate = self.walk(key);
        let bit = calc_id(key, self.nodes[candidate].name.as_bytes())
            .ok_or_else(|| Error::invalid(format!("duplicate dictionary entry {name:?}")))?;
        let bit = u16::try_from(bit)
            .ok()
            .filter(|&b| b != ROOT_ID)
            .ok_or_else(|| Error::invalid(format!("dictionary name too long: {} bytes", key.len())))?;

        let mut prev = 0usize;
        let mut cur = self.nodes[0].left as usize;
        while self.nodes[cur].id > bit && self.nodes[cur].id < self.nodes[prev].id {
            prev = cur;
            let node = &self.nodes[cur];
            cur = if name_bit(key, node.id) { node.right } else { node.left } as usize;
        }

        let index = self.nodes.len();
        let index16 = u16::try_from(index).map_err(|_| Error::invalid("too many dictionary entries"))?;
        let (left, right) = if name_bit(key, bit) {
            (cur as u16, index16)
        } else {
            (index16, cur as u16)
        };
        let goes_right = prev != 0 && name_bit(key, self.nodes[prev].id);
        self.nodes.push(DictNode { id: bit, left, right, name, data });
        if goes_right {
            self.nodes[prev].right = index16;
        } else {
            self.nodes[prev].left = index16;
        }
        Ok(())
    }

    /// Decode a dictionary at the cursor. Data addresses must fall inside
    /// `owner`. When the enclosing block declares an entry count, pass it as
    /// `expected` to cross-check the header.
    pub fn read(r: &mut Reader<'_>, owner: &Region, expected: Option<usize>) -> Result<Self> {
        let start = r.tell();
        let _size = r.read_u32()?;
        let count = r.read_u32()? as usize;
        if let Some(expected) = expected {
            if expected != count {
                return Err(Error::invalid(format!(
                    "dictionary at 0x{start:X} has {count} entries, expected {expected}"
                )));
            }
        }
        let min_end = start as u64 + calc_dictionary_size(count) as u64;
        if min_end > r.len() as u64 {
            return Err(Error::UnexpectedEof(min_end));
        }

        let mut nodes = Vec::with_capacity(count + 1);
        for i in 0..=count {
            let id = r.read_u16()?;
            let _flag = r.read_u16()?;
            let left = r.read_u16()?;
            let right = r.read_u16()?;
            if left as usize > count || right as usize > count {
                return Err(Error::invalid(format!(
                    "dictionary node {i} links past the node array ({left}, {right})"
                )));
            }
            if i == 0 {
                r.skip(8)?;
                nodes.push(DictNode { id, left, right, name: String::new(), data: 0 });
                continue;
            }
            let name = r.read_name(start)?;
            let data = owner.resolve_from(start, r.read_i32()?)?;
            nodes.push(DictNode { id, left, right, name, data });
        }
        Ok(Self { nodes })
    }

    /// Encode at the cursor, registering names in `names`.
    pub fn write(&self, w: &mut Writer, names: &mut NameTable) -> Result<()> {
        let start = w.tell();
        w.write_u32(calc_dictionary_size(self.len()))?;
        w.write_u32(self.len() as u32)?;
        for (i, node) in self.nodes.iter().enumerate() {
            w.write_u16(node.id)?;
            w.write_u16(0)?;
            w.write_u16(node.left)?;
            w.write_u16(node.right)?;
            if i == 0 {
                w.write_i32(0)?;
                w.write_i32(0)?;
            } else {
                names.write_ref(w, start, &node.name)?;
                w.write_offset(node.data, start)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_id() {
        assert_eq!(calc_id(b"a", b"a"), None);
        // 'a' = 0x61, highest bit 6
        assert_eq!(calc_id(b"a", b""), Some(6));
        // "ab" vs "ac": byte 1, 0x62 ^ 0x63 = 1
        assert_eq!(calc_id(b"ab", b"ac"), Some(8));
        // length difference dominates
        assert_eq!(calc_id(b"abc", b"ab"), Some((2 << 3) | 6));
    }

    #[test]
    fn test_find_every_entry() {
        let names = ["root", "arm_L", "arm_R", "leg_L", "leg_R", "head", "a", "ab", "abc"];
        let dict = Dictionary::from_entries(names.iter().enumerate().map(|(i, n)| (*n, 0x100 + i as u32))).unwrap();
        assert_eq!(dict.len(), names.len());
        for (i, n) in names.iter().enumerate() {
            let node = dict.find(n).unwrap_or_else(|| panic!("{n} not found"));
            assert_eq!(node.data, 0x100 + i as u32);
        }
        assert!(dict.find("arm").is_none());
        assert!(dict.find("").is_none());
        let order: Vec<_> = dict.entries().map(|(n, _)| n).collect();
        assert_eq!(order, names);
    }

    #[test]
    fn test_single_entry_shape() {
        let dict = Dictionary::from_entries([("a", 0x40)]).unwrap();
        let nodes = dict.nodes();
        assert_eq!(nodes[0].left, 1);
        assert_eq!(nodes[1].id, 6);
        assert_eq!((nodes[1].left, nodes[1].right), (0, 1));
    }

    #[test]
    fn test_duplicate_and_empty_rejected() {
        assert!(Dictionary::from_entries([("x", 0), ("x", 4)]).is_err());
        assert!(Dictionary::from_entries([("", 0)]).is_err());
    }

    #[test]
    fn test_roundtrip_through_bytes() {
        let dict = Dictionary::from_entries([("DrawOpa", 0x60), ("NodeTree", 0x64), ("NodeMix", 0x68)]).unwrap();
        let mut w = Writer::new();
        let mut names = NameTable::new();
        dict.write(&mut w, &mut names).unwrap();
        assert_eq!(w.tell(), calc_dictionary_size(3));
        w.write_zeros(0x70 - w.tell() as usize).unwrap();
        names.flush(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        let owner = Region::new("test", 0, bytes.len() as u32);
        let back = Dictionary::read(&mut r, &owner, Some(3)).unwrap();
        assert_eq!(back, dict);

        let mut r = Reader::new(&bytes);
        assert!(Dictionary::read(&mut r, &owner, Some(2)).is_err());
    }

    #[test]
    fn test_data_outside_owner_rejected() {
        let dict = Dictionary::from_entries([("far", 0x400)]).unwrap();
        let mut w = Writer::new();
        let mut names = NameTable::new();
        dict.write(&mut w, &mut names).unwrap();
        names.flush(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        let owner = Region::new("small", 0, 0x100);
        assert!(matches!(
            Dictionary::read(&mut r, &owner, None),
            Err(Error::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_truncated_dictionary() {
        let bytes = [0u8, 0, 0, 0x38, 0, 0, 0, 2, 0xFF, 0xFF];
        let mut r = Reader::new(&bytes);
        let owner = Region::new("t", 0, 10);
        assert!(matches!(Dictionary::read(&mut r, &owner, None), Err(Error::UnexpectedEof(_))));
    }
}
