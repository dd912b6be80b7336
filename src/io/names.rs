//! Shared string pool.
//!
//! Every name in an archive is stored once, at the end of the file, and
//! referenced by a signed offset whose base depends on the field. Writers
//! reserve the offset field with [`NameTable::write_ref`] and the pool is
//! emitted and all references patched by [`NameTable::flush`].

use std::collections::BTreeMap;

use super::writer::Writer;
use crate::util::Result;

#[derive(Debug)]
struct NameRef {
    field: u32,
    base: u32,
    name: String,
}

/// Deferred name references for one archive.
#[derive(Debug, Default)]
pub struct NameTable {
    refs: Vec<NameRef>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an offset field at the cursor pointing at `name`, relative to
    /// `base`. Empty names are written as a zero offset.
    pub fn write_ref(&mut self, w: &mut Writer, base: u32, name: &str) -> Result<()> {
        if !name.is_empty() {
            self.refs.push(NameRef { field: w.tell(), base, name: name.to_string() });
        }
        w.write_i32(0)
    }

    /// Number of pending references.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Emit the pool at the cursor (sorted, deduplicated) and patch every
    /// reserved field. Each entry is `u32 length, bytes, NUL`, padded to 4.
    pub fn flush(self, w: &mut Writer) -> Result<()> {
        let mut pool: BTreeMap<&str, u32> = BTreeMap::new();
        for r in &self.refs {
            pool.insert(r.name.as_str(), 0);
        }
        for (name, addr) in pool.iter_mut() {
            w.write_u32(name.len() as u32)?;
            *addr = w.tell();
            w.write_bytes(name.as_bytes())?;
            w.write_u8(0)?;
            w.align(4)?;
        }
        for r in &self.refs {
            let addr = pool[r.name.as_str()];
            w.patch_i32(r.field, super::format::rel(addr, r.base))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Reader;

    #[test]
    fn test_pool_dedups_and_patches() {
        let mut w = Writer::new();
        let mut names = NameTable::new();
        names.write_ref(&mut w, 0, "mat").unwrap();
        names.write_ref(&mut w, 4, "mat").unwrap();
        names.write_ref(&mut w, 0, "").unwrap();
        names.write_ref(&mut w, 0, "bone").unwrap();
        names.flush(&mut w).unwrap();
        let bytes = w.into_bytes();

        // "bone" (4 + 8) then "mat" (4 + 4) after 16 bytes of fields
        assert_eq!(bytes.len(), 16 + 12 + 8);
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_name(0).unwrap(), "mat");
        assert_eq!(r.read_name(4).unwrap(), "mat");
        assert_eq!(r.read_name(0).unwrap(), "");
        assert_eq!(r.read_name(0).unwrap(), "bone");
    }
}
