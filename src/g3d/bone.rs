//! Bone blocks as stored on disk.
//!
//! ```text
//! 0x00 u32 size (0xD0)      0x20 vec3 scale
//! 0x04 s32 model offset     0x2C vec3 rotation (degrees)
//! 0x08 s32 name offset      0x38 vec3 translation
//! 0x0C u32 index            0x44 vec3 aabb min, 0x50 vec3 aabb max
//! 0x10 u32 matrix id        0x5C s32 parent, 0x60 first child,
//! 0x14 u32 flag                  0x64 right sibling, 0x68 left sibling
//! 0x18 u32 billboard        0x6C s32 user data
//! 0x1C u32 billboard parent 0x70 mtx34 model, 0xA0 mtx34 inverse model
//! ```
//!
//! Links are offsets relative to the bone, zero for none.

use std::collections::HashMap;

use super::gx::{gx_enum, read_enum32};
use crate::io::format::rel;
use crate::io::{NameTable, Reader, Writer};
use crate::util::{Aabb, Error, Mtx34, Result, Vec3};

pub const BONE_SIZE: u32 = 0xD0;

/// All of translation, rotation and scale are identity.
pub const BONE_IDENTITY: u32 = 0x001;
pub const BONE_TRANS_ZERO: u32 = 0x002;
pub const BONE_ROT_ZERO: u32 = 0x004;
pub const BONE_SCALE_ONE: u32 = 0x008;
pub const BONE_SCALE_UNIFORM: u32 = 0x010;
/// Segment scale compensation applies to this bone.
pub const BONE_SSC: u32 = 0x020;
/// A direct child applies segment scale compensation.
pub const BONE_SSC_PARENT: u32 = 0x040;
pub const BONE_NO_CLASSIC_SCALE: u32 = 0x080;
pub const BONE_VISIBLE: u32 = 0x100;
pub const BONE_HAS_GEOMETRY: u32 = 0x200;
pub const BONE_BILLBOARD_PARENT: u32 = 0x400;

gx_enum! {
    pub enum Billboard {
        #[default] None = 0,
        Standard = 1,
        PerspectiveStandard = 2,
        Rotation = 3,
        PerspectiveRotation = 4,
        Y = 5,
        PerspectiveY = 6,
    }
}

/// Bone record with links already resolved to bone indices (-1 for none).
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryBone {
    pub name: String,
    pub id: u32,
    pub matrix_id: u32,
    pub flag: u32,
    pub billboard: Billboard,
    pub scale: Vec3,
    pub rotate: Vec3,
    pub translate: Vec3,
    pub aabb: Aabb,
    pub parent: i32,
    pub first_child: i32,
    pub right_sibling: i32,
    pub left_sibling: i32,
    pub model_mtx: Mtx34,
    pub inverse_model_mtx: Mtx34,
}

impl Default for BinaryBone {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: 0,
            matrix_id: 0,
            flag: 0,
            billboard: Billboard::None,
            scale: Vec3::ONE,
            rotate: Vec3::ZERO,
            translate: Vec3::ZERO,
            aabb: Aabb::default(),
            parent: -1,
            first_child: -1,
            right_sibling: -1,
            left_sibling: -1,
            model_mtx: Mtx34::IDENTITY,
            inverse_model_mtx: Mtx34::IDENTITY,
        }
    }
}

impl BinaryBone {
    /// Decode at the cursor. `bone_at` maps bone addresses to indices; the
    /// parent link must resolve, the other links are kept only if they do.
    pub fn read(r: &mut Reader<'_>, bone_at: &HashMap<u32, usize>) -> Result<Self> {
        let start = r.tell();
        let size = r.read_u32()?;
        if size < BONE_SIZE {
            return Err(Error::invalid(format!("bone at 0x{start:X} has size 0x{size:X}")));
        }
        let _model_ofs = r.read_i32()?;
        let name = r.read_name(start)?;
        let id = r.read_u32()?;
        let matrix_id = r.read_u32()?;
        let flag = r.read_u32()?;
        let billboard = read_enum32(r, "bone billboard mode", Billboard::from_u8)?;
        let _billboard_parent = r.read_u32()?;
        let scale = r.read_vec3()?;
        let rotate = r.read_vec3()?;
        let translate = r.read_vec3()?;
        let aabb = Aabb::new(r.read_vec3()?, r.read_vec3()?);

        let link = |ofs: i32| -> Option<i32> {
            if ofs == 0 {
                return Some(-1);
            }
            let addr = (start as i64 + ofs as i64) as u32;
            bone_at.get(&addr).map(|&i| i as i32)
        };
        let parent_ofs = r.read_i32()?;
        let parent = link(parent_ofs)
            .ok_or_else(|| Error::invalid(format!("bone {name}: parent offset {parent_ofs} is not a bone")))?;
        let first_child = link(r.read_i32()?).unwrap_or(-1);
        let right_sibling = link(r.read_i32()?).unwrap_or(-1);
        let left_sibling = link(r.read_i32()?).unwrap_or(-1);
        let _user_data = r.read_i32()?;
        let model_mtx = r.read_mtx34()?;
        let inverse_model_mtx = r.read_mtx34()?;

        Ok(Self {
            name,
            id,
            matrix_id,
            flag,
            billboard,
            scale,
            rotate,
            translate,
            aabb,
            parent,
            first_child,
            right_sibling,
            left_sibling,
            model_mtx,
            inverse_model_mtx,
        })
    }

    /// Encode at the cursor. `bone_addrs[i]` is where bone `i` is written.
    pub fn write(&self, w: &mut Writer, names: &mut NameTable, model_start: u32, bone_addrs: &[u32]) -> Result<()> {
        let start = w.tell();
        let link = |index: i32| -> Result<i32> {
            if index < 0 {
                return Ok(0);
            }
            bone_addrs
                .get(index as usize)
                .map(|&addr| rel(addr, start))
                .ok_or_else(|| Error::WriteFailed(format!("bone {}: link to missing bone {index}", self.name)))
        };

        w.write_u32(BONE_SIZE)?;
        w.write_offset(model_start, start)?;
        names.write_ref(w, start, &self.name)?;
        w.write_u32(self.id)?;
        w.write_u32(self.matrix_id)?;
        w.write_u32(self.flag)?;
        w.write_u32(self.billboard.to_u8() as u32)?;
        w.write_u32(0)?;
        w.write_vec3(self.scale)?;
        w.write_vec3(self.rotate)?;
        w.write_vec3(self.translate)?;
        w.write_vec3(self.aabb.min)?;
        w.write_vec3(self.aabb.max)?;
        w.write_i32(link(self.parent)?)?;
        w.write_i32(link(self.first_child)?)?;
        w.write_i32(link(self.right_sibling)?)?;
        w.write_i32(link(self.left_sibling)?)?;
        w.write_i32(0)?;
        w.write_mtx34(&self.model_mtx)?;
        w.write_mtx34(&self.inverse_model_mtx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_resolve_to_indices() {
        let bones = [
            BinaryBone { name: "root".into(), first_child: 1, ..Default::default() },
            BinaryBone { name: "hip".into(), id: 1, matrix_id: 1, parent: 0, ..Default::default() },
        ];
        let addrs = [0x0, BONE_SIZE];
        let mut w = Writer::new();
        let mut names = NameTable::new();
        for b in &bones {
            b.write(&mut w, &mut names, 0, &addrs).unwrap();
        }
        assert_eq!(w.tell(), 2 * BONE_SIZE);
        names.flush(&mut w).unwrap();
        let bytes = w.into_bytes();

        let map: HashMap<u32, usize> = addrs.iter().enumerate().map(|(i, &a)| (a, i)).collect();
        let mut r = Reader::new(&bytes);
        let root = BinaryBone::read(&mut r, &map).unwrap();
        r.seek_set(BONE_SIZE).unwrap();
        let hip = BinaryBone::read(&mut r, &map).unwrap();
        assert_eq!(root, bones[0]);
        assert_eq!(hip, bones[1]);
    }

    #[test]
    fn test_dangling_parent_rejected_but_child_ignored() {
        let bone = BinaryBone { name: "b".into(), parent: 1, first_child: 1, ..Default::default() };
        let mut w = Writer::new();
        let mut names = NameTable::new();
        bone.write(&mut w, &mut names, 0, &[0, 0x400]).unwrap();
        let bytes = w.into_bytes();
        let map = HashMap::from([(0u32, 0usize)]);
        assert!(BinaryBone::read(&mut Reader::new(&bytes), &map).is_err());

        let orphan = BinaryBone { name: "b".into(), first_child: 1, ..Default::default() };
        let mut w = Writer::new();
        orphan.write(&mut w, &mut names, 0, &[0, 0x400]).unwrap();
        let bytes = w.into_bytes();
        let back = BinaryBone::read(&mut Reader::new(&bytes), &map).unwrap();
        assert_eq!(back.first_child, -1);
    }
}
