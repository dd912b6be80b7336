//! Model sub-file (`MDL0`, version 11) in its on-disk shape.
//!
//! ```text
//! 0x00 "MDL0"  0x04 u32 size  0x08 u32 version  0x0C s32 archive offset
//! 0x10 s32 x 14 section dictionaries (relative to MDL0)
//! 0x48 s32 name offset
//! 0x4C info block (0x40 bytes)
//! 0x8C matrix -> bone table: u32 count, s32 bone[count]
//! ```
//!
//! Dictionaries follow the table, then bytecode, bones, materials and
//! meshes, in that order.

use std::collections::HashMap;

use tracing::debug;

use super::bone::{BinaryBone, BONE_SIZE};
use super::bytecode::ByteCodeMethod;
use super::gx::{gx_enum, read_enum32};
use super::material::Material;
use super::mesh::Mesh;
use crate::io::format::{align_up, rel, MDL0_MAGIC, MDL0_VERSION};
use crate::io::{calc_dictionary_size, Dictionary, NameTable, Reader, Writer};
use crate::report::IoContext;
use crate::util::{Aabb, Error, Result};

pub const MDL0_SECTION_COUNT: usize = 14;
pub const MDL0_INFO_OFFSET: u32 = 0x4C;
pub const MDL0_INFO_SIZE: u32 = 0x40;
pub const MDL0_LUT_OFFSET: u32 = MDL0_INFO_OFFSET + MDL0_INFO_SIZE;

const SECTION_BYTECODE: usize = 0;
const SECTION_BONES: usize = 1;
const SECTION_MATERIALS: usize = 8;
const SECTION_MESHES: usize = 10;

const SECTION_NAMES: [&str; MDL0_SECTION_COUNT] = [
    "bytecode",
    "bones",
    "positions",
    "normals",
    "colors",
    "texcoords",
    "fur vectors",
    "fur layers",
    "materials",
    "shaders",
    "meshes",
    "texture links",
    "palette links",
    "user data",
];

gx_enum! {
    /// How bone scale composes down the hierarchy.
    pub enum ScalingRule {
        #[default] Standard = 0,
        Xsi = 1,
        Maya = 2,
    }
}

gx_enum! {
    /// Texture matrix convention of the authoring tool.
    pub enum TexMatrixMode {
        #[default] Maya = 0,
        Xsi = 1,
        Max = 2,
    }
}

gx_enum! {
    pub enum EnvelopeMatrixMode {
        #[default] Normal = 0,
        Approximation = 1,
        Exact = 2,
    }
}

/// Model info block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelInfo {
    pub scaling_rule: ScalingRule,
    pub tex_mtx_mode: TexMatrixMode,
    pub num_verts: u32,
    pub num_tris: u32,
    pub source_location: String,
    pub num_view_mtx: u32,
    pub normal_mtx_array: bool,
    pub tex_mtx_array: bool,
    pub bound_volume: bool,
    pub evp_mtx_mode: EnvelopeMatrixMode,
    pub aabb: Aabb,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinaryModel {
    pub name: String,
    pub info: ModelInfo,
    /// Bone owning each draw matrix, -1 for blended matrices.
    pub matrix_to_bone: Vec<i32>,
    pub bytecodes: Vec<ByteCodeMethod>,
    pub bones: Vec<BinaryBone>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
}

/// Addresses of everything in a model, computed before writing.
struct Layout {
    dicts: [u32; MDL0_SECTION_COUNT],
    bytecodes: Vec<u32>,
    bones: Vec<u32>,
    materials: Vec<u32>,
    meshes: Vec<u32>,
    end: u32,
}

fn place<T>(items: &[T], accum: &mut u32, size: impl Fn(&T) -> u32) -> Vec<u32> {
    items
        .iter()
        .map(|item| {
            let addr = *accum;
            *accum += size(item);
            addr
        })
        .collect()
}

impl BinaryModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    fn layout(&self, start: u32) -> Layout {
        let mut accum = start + MDL0_LUT_OFFSET + 4 + 4 * self.matrix_to_bone.len() as u32;
        let mut dicts = [0; MDL0_SECTION_COUNT];
        for (section, count) in [
            (SECTION_BYTECODE, self.bytecodes.len()),
            (SECTION_BONES, self.bones.len()),
            (SECTION_MATERIALS, self.materials.len()),
            (SECTION_MESHES, self.meshes.len()),
        ] {
            if count > 0 {
                dicts[section] = accum;
                accum += calc_dictionary_size(count);
            }
        }
        let bytecodes = place(&self.bytecodes, &mut accum, ByteCodeMethod::size);
        accum = align_up(accum, 4);
        let bones = place(&self.bones, &mut accum, |_| BONE_SIZE);
        let materials = place(&self.materials, &mut accum, Material::size);
        let meshes = place(&self.meshes, &mut accum, Mesh::size);
        Layout { dicts, bytecodes, bones, materials, meshes, end: accum }
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> u32 {
        self.layout(0).end
    }

    /// Decode a sub-file at the cursor. Sections this codec does not model
    /// are reported and skipped.
    pub fn read(r: &mut Reader<'_>, ctx: &mut IoContext<'_>) -> Result<Self> {
        let region = r.section("MDL0", MDL0_MAGIC)?;
        let version = r.read_u32()?;
        if version != MDL0_VERSION {
            return Err(Error::UnsupportedVersion { section: "MDL0", version });
        }
        let _brres_ofs = r.read_i32()?;
        let mut sections = [0i32; MDL0_SECTION_COUNT];
        for s in &mut sections {
            *s = r.read_i32()?;
        }
        let name = r.read_name(region.start)?;

        let info_start = r.tell();
        let info_size = r.read_u32()?;
        if info_size < MDL0_INFO_SIZE {
            return Err(Error::invalid(format!("MDL0 info block of 0x{info_size:X} bytes")));
        }
        let _mdl0_ofs = r.read_i32()?;
        let scaling_rule = read_enum32(r, "scaling rule", ScalingRule::from_u8)?;
        let tex_mtx_mode = read_enum32(r, "texture matrix mode", TexMatrixMode::from_u8)?;
        let num_verts = r.read_u32()?;
        let num_tris = r.read_u32()?;
        let source_location = r.read_name(info_start)?;
        let num_view_mtx = r.read_u32()?;
        let normal_mtx_array = r.read_bool()?;
        let tex_mtx_array = r.read_bool()?;
        let bound_volume = r.read_bool()?;
        let evp_mtx_mode = EnvelopeMatrixMode::from_u8(r.read_u8()?)?;
        let lut_addr = region.resolve_from(info_start, r.read_i32()?)?;
        let aabb = Aabb::new(r.read_vec3()?, r.read_vec3()?);
        let info = ModelInfo {
            scaling_rule,
            tex_mtx_mode,
            num_verts,
            num_tris,
            source_location,
            num_view_mtx,
            normal_mtx_array,
            tex_mtx_array,
            bound_volume,
            evp_mtx_mode,
            aabb,
        };

        r.seek_set(lut_addr)?;
        let lut_len = r.read_u32()? as usize;
        let lut_end = r.tell() as u64 + 4 * lut_len as u64;
        if lut_end > region.end as u64 {
            return Err(Error::UnexpectedEof(lut_end));
        }
        let matrix_to_bone = (0..lut_len).map(|_| r.read_i32()).collect::<Result<Vec<_>>>()?;

        let mut model = Self { name, info, matrix_to_bone, ..Default::default() };
        let mut dicts: [Option<Dictionary>; MDL0_SECTION_COUNT] = Default::default();
        for (i, &ofs) in sections.iter().enumerate() {
            if ofs == 0 {
                continue;
            }
            if ![SECTION_BYTECODE, SECTION_BONES, SECTION_MATERIALS, SECTION_MESHES].contains(&i) {
                ctx.warn(format!("{} section is not supported and was ignored", SECTION_NAMES[i]));
                continue;
            }
            r.seek_set(region.resolve(ofs)?)?;
            dicts[i] = Some(Dictionary::read(r, &region, None)?);
        }

        if let Some(dict) = &dicts[SECTION_BYTECODE] {
            for (name, addr) in dict.entries() {
                model.bytecodes.push(r.at(addr, |r| ByteCodeMethod::read(r, name))?);
            }
        }
        if let Some(dict) = &dicts[SECTION_BONES] {
            let bone_at: HashMap<u32, usize> = dict.entries().enumerate().map(|(i, (_, addr))| (addr, i)).collect();
            for (i, (_, addr)) in dict.entries().enumerate() {
                let bone = r.at(addr, |r| BinaryBone::read(r, &bone_at))?;
                ctx.request(bone.id as usize == i, format!("bone {} is stored at slot {i} but has id {}", bone.name, bone.id));
                model.bones.push(bone);
            }
        }
        if let Some(dict) = &dicts[SECTION_MATERIALS] {
            for (_, addr) in dict.entries() {
                model.materials.push(r.at(addr, Material::read)?);
            }
        }
        if let Some(dict) = &dicts[SECTION_MESHES] {
            for (_, addr) in dict.entries() {
                model.meshes.push(r.at(addr, Mesh::read)?);
            }
        }
        debug!(
            model = %model.name,
            bones = model.bones.len(),
            materials = model.materials.len(),
            meshes = model.meshes.len(),
            methods = model.bytecodes.len(),
            "read MDL0"
        );
        Ok(model)
    }

    pub fn write(&self, w: &mut Writer, names: &mut NameTable, brres_start: u32) -> Result<()> {
        let mut s = w.section(MDL0_MAGIC)?;
        let start = s.start();
        let layout = self.layout(start);

        s.write_u32(MDL0_VERSION)?;
        s.write_offset(brres_start, start)?;
        for &addr in &layout.dicts {
            s.write_i32(if addr == 0 { 0 } else { rel(addr, start) })?;
        }
        names.write_ref(&mut s, start, &self.name)?;

        let info_start = s.tell();
        let info = &self.info;
        s.write_u32(MDL0_INFO_SIZE)?;
        s.write_offset(start, info_start)?;
        s.write_u32(info.scaling_rule.to_u8() as u32)?;
        s.write_u32(info.tex_mtx_mode.to_u8() as u32)?;
        s.write_u32(info.num_verts)?;
        s.write_u32(info.num_tris)?;
        names.write_ref(&mut s, info_start, &info.source_location)?;
        s.write_u32(info.num_view_mtx)?;
        s.write_bool(info.normal_mtx_array)?;
        s.write_bool(info.tex_mtx_array)?;
        s.write_bool(info.bound_volume)?;
        s.write_u8(info.evp_mtx_mode.to_u8())?;
        s.write_i32(MDL0_INFO_SIZE as i32)?;
        s.write_vec3(info.aabb.min)?;
        s.write_vec3(info.aabb.max)?;

        s.write_u32(self.matrix_to_bone.len() as u32)?;
        for &bone in &self.matrix_to_bone {
            s.write_i32(bone)?;
        }

        let dict = |keys: Vec<&str>, addrs: &[u32]| Dictionary::from_entries(keys.into_iter().zip(addrs.iter().copied()));
        if !self.bytecodes.is_empty() {
            dict(self.bytecodes.iter().map(|m| m.name.as_str()).collect(), &layout.bytecodes)?.write(&mut s, names)?;
        }
        if !self.bones.is_empty() {
            dict(self.bones.iter().map(|b| b.name.as_str()).collect(), &layout.bones)?.write(&mut s, names)?;
        }
        if !self.materials.is_empty() {
            dict(self.materials.iter().map(|m| m.name.as_str()).collect(), &layout.materials)?.write(&mut s, names)?;
        }
        if !self.meshes.is_empty() {
            dict(self.meshes.iter().map(|m| m.name.as_str()).collect(), &layout.meshes)?.write(&mut s, names)?;
        }

        for method in &self.bytecodes {
            method.write(&mut s)?;
        }
        s.align(4)?;
        for bone in &self.bones {
            bone.write(&mut s, names, start, &layout.bones)?;
        }
        for (i, mat) in self.materials.iter().enumerate() {
            mat.write(&mut s, names, start, i as u32)?;
        }
        for (i, mesh) in self.meshes.iter().enumerate() {
            mesh.write(&mut s, names, start, i as u32)?;
        }

        if s.tell() != layout.end {
            return Err(Error::WriteFailed(format!(
                "MDL0 {} laid out to 0x{:X} but wrote to 0x{:X}",
                self.name,
                layout.end,
                s.tell()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g3d::bytecode::{Command, METHOD_DRAW_OPA, METHOD_NODE_TREE};
    use crate::report::Transaction;
    use crate::util::Vec3;

    fn sample() -> BinaryModel {
        let mut m = BinaryModel::new("cube");
        m.info.num_verts = 3;
        m.info.num_tris = 1;
        m.info.num_view_mtx = 1;
        m.info.source_location = "cube.dae".into();
        m.info.aabb = Aabb::new(Vec3::splat(-1.0), Vec3::ONE);
        m.matrix_to_bone = vec![0];
        let mut tree = ByteCodeMethod::new(METHOD_NODE_TREE);
        tree.commands.push(Command::NodeDescendence { bone: 0, parent_matrix: 0 });
        let mut opa = ByteCodeMethod::new(METHOD_DRAW_OPA);
        opa.commands.push(Command::Draw { material: 0, mesh: 0, bone: 0, priority: 0 });
        m.bytecodes = vec![tree, opa];
        m.bones.push(BinaryBone { name: "root".into(), ..Default::default() });
        m.materials.push(Material::new("mat"));
        m.meshes.push(Mesh {
            current_matrix: 0,
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![0, 1, 2],
            ..Mesh::new("poly")
        });
        m
    }

    #[test]
    fn test_layout_matches_writer() {
        let model = sample();
        let mut w = Writer::new();
        let mut names = NameTable::new();
        model.write(&mut w, &mut names, 0).unwrap();
        assert_eq!(w.tell(), model.size());
        names.flush(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut tx = Transaction::new();
        let back = BinaryModel::read(&mut Reader::new(&bytes), &mut IoContext::new("cube", &mut tx)).unwrap();
        assert!(tx.is_clean(), "{:?}", tx.messages());
        assert_eq!(back, model);
    }

    #[test]
    fn test_unsupported_section_warns() {
        let model = sample();
        let mut w = Writer::new();
        let mut names = NameTable::new();
        model.write(&mut w, &mut names, 0).unwrap();
        names.flush(&mut w).unwrap();
        let mut bytes = w.into_bytes();
        // Point the shader dictionary at the bone dictionary
        let bones = bytes[0x14..0x18].to_vec();
        bytes[0x10 + 4 * 9..0x10 + 4 * 10].copy_from_slice(&bones);

        let mut tx = Transaction::new();
        let back = BinaryModel::read(&mut Reader::new(&bytes), &mut IoContext::new("cube", &mut tx)).unwrap();
        assert_eq!(back, model);
        assert_eq!(tx.warnings().count(), 1);
        assert!(tx.messages()[0].text.contains("shaders"));
    }

    #[test]
    fn test_wrong_version() {
        let mut w = Writer::new();
        let mut names = NameTable::new();
        sample().write(&mut w, &mut names, 0).unwrap();
        let mut bytes = w.into_bytes();
        bytes[8..12].copy_from_slice(&10u32.to_be_bytes());
        let mut tx = Transaction::new();
        let err = BinaryModel::read(&mut Reader::new(&bytes), &mut IoContext::new("m", &mut tx)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { section: "MDL0", version: 10 }));
    }
}
