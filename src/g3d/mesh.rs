//! Mesh blocks.
//!
//! Meshes are carried as indexed triangle lists with their matrix binding
//! data; GPU display-list encoding is left to the consumer.
//!
//! ```text
//! 0x00 u32 size            0x14 u32 vertex descriptor
//! 0x04 s32 model offset    0x18 u32 palette count
//! 0x08 s16 current matrix  0x1C u32 position count
//! 0x0A u16 padding         0x20 u32 normal count
//! 0x0C s32 name offset     0x24 u32 index count
//! 0x10 u32 index
//! 0x28 s16 palette[] (padded to 4), vec3 positions[], vec3 normals[],
//!      u16 indices[] (padded to 4)
//! ```

use std::collections::BTreeSet;

use crate::io::format::align_up;
use crate::io::{NameTable, Reader, Writer};
use crate::util::{Error, Result, Vec3};

pub const MESH_HEADER_SIZE: u32 = 0x28;

/// Vertices carry a position/normal matrix index.
pub const VCD_POSITION_MATRIX_INDEX: u32 = 1 << 0;
/// Bits 1..=8: texture coordinate `n` carries a texture matrix index.
pub const VCD_TEX_MATRIX_INDEX_MASK: u32 = 0xFF << 1;
/// Vertices carry normals.
pub const VCD_NORMAL: u32 = 1 << 9;

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    /// Matrix of a rigid mesh, -1 when vertices select from the palette.
    pub current_matrix: i16,
    pub matrix_palette: Vec<i16>,
    pub vertex_descriptor: u32,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Triangle list.
    pub indices: Vec<u16>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            name: String::new(),
            current_matrix: -1,
            matrix_palette: Vec::new(),
            vertex_descriptor: 0,
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.indices.len() as u32
    }

    #[inline]
    pub fn triangle_count(&self) -> u32 {
        self.indices.len() as u32 / 3
    }

    /// Skinned meshes with normals need per-bone normal matrices.
    pub fn needs_normal_mtx(&self) -> bool {
        self.vertex_descriptor & VCD_POSITION_MATRIX_INDEX != 0 && self.vertex_descriptor & VCD_NORMAL != 0
    }

    /// Any texture coordinate indexing a texture matrix needs per-bone texture
    /// matrices.
    pub fn needs_texture_mtx(&self) -> bool {
        self.vertex_descriptor & VCD_TEX_MATRIX_INDEX_MASK != 0
    }

    /// Draw matrices this mesh references.
    pub fn display_matrices(&self) -> impl Iterator<Item = i16> + '_ {
        std::iter::once(self.current_matrix)
            .chain(self.matrix_palette.iter().copied())
            .filter(|&m| m >= 0)
    }

    pub fn size(&self) -> u32 {
        MESH_HEADER_SIZE
            + align_up(2 * self.matrix_palette.len() as u32, 4)
            + 12 * self.positions.len() as u32
            + 12 * self.normals.len() as u32
            + align_up(2 * self.indices.len() as u32, 4)
    }

    pub fn read(r: &mut Reader<'_>) -> Result<Self> {
        let start = r.tell();
        let _size = r.read_u32()?;
        let _model_ofs = r.read_i32()?;
        let current_matrix = r.read_i16()?;
        r.skip(2)?;
        let name = r.read_name(start)?;
        let _index = r.read_u32()?;
        let vertex_descriptor = r.read_u32()?;
        let n_palette = r.read_u32()? as usize;
        let n_positions = r.read_u32()? as usize;
        let n_normals = r.read_u32()? as usize;
        let n_indices = r.read_u32()? as usize;

        // Reject absurd counts before allocating for them
        let needed = 2 * n_palette as u64 + 12 * (n_positions + n_normals) as u64 + 2 * n_indices as u64;
        if r.tell() as u64 + needed > r.len() as u64 {
            return Err(Error::UnexpectedEof(r.tell() as u64 + needed));
        }

        let mut matrix_palette = Vec::with_capacity(n_palette);
        for _ in 0..n_palette {
            matrix_palette.push(r.read_i16()?);
        }
        r.seek_set(start + MESH_HEADER_SIZE + align_up(2 * n_palette as u32, 4))?;
        let positions = (0..n_positions).map(|_| r.read_vec3()).collect::<Result<Vec<_>>>()?;
        let normals = (0..n_normals).map(|_| r.read_vec3()).collect::<Result<Vec<_>>>()?;
        let indices = (0..n_indices).map(|_| r.read_u16()).collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            current_matrix,
            matrix_palette,
            vertex_descriptor,
            positions,
            normals,
            indices,
        })
    }

    pub fn write(&self, w: &mut Writer, names: &mut NameTable, model_start: u32, index: u32) -> Result<()> {
        let start = w.tell();
        w.write_u32(self.size())?;
        w.write_offset(model_start, start)?;
        w.write_i16(self.current_matrix)?;
        w.write_u16(0)?;
        names.write_ref(w, start, &self.name)?;
        w.write_u32(index)?;
        w.write_u32(self.vertex_descriptor)?;
        w.write_u32(self.matrix_palette.len() as u32)?;
        w.write_u32(self.positions.len() as u32)?;
        w.write_u32(self.normals.len() as u32)?;
        w.write_u32(self.indices.len() as u32)?;
        for m in &self.matrix_palette {
            w.write_i16(*m)?;
        }
        w.align(4)?;
        for p in &self.positions {
            w.write_vec3(*p)?;
        }
        for n in &self.normals {
            w.write_vec3(*n)?;
        }
        for i in &self.indices {
            w.write_u16(*i)?;
        }
        w.align(4)
    }
}

/// Summed vertex and triangle counts, as declared in the model header.
pub fn compute_vert_tri_counts(meshes: &[Mesh]) -> (u32, u32) {
    meshes
        .iter()
        .fold((0, 0), |(v, t), m| (v + m.vertex_count(), t + m.triangle_count()))
}

/// Distinct draw matrices referenced by any mesh.
pub fn compute_display_matrices(meshes: &[Mesh]) -> BTreeSet<i16> {
    meshes.iter().flat_map(|m| m.display_matrices()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skinned() -> Mesh {
        Mesh {
            name: "body".into(),
            current_matrix: -1,
            matrix_palette: vec![0, 3, 4],
            vertex_descriptor: VCD_POSITION_MATRIX_INDEX | VCD_NORMAL,
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_predicates() {
        let m = skinned();
        assert!(m.needs_normal_mtx());
        assert!(!m.needs_texture_mtx());
        let rigid = Mesh { current_matrix: 2, vertex_descriptor: 1 << 3, ..Mesh::new("r") };
        assert!(!rigid.needs_normal_mtx());
        assert!(rigid.needs_texture_mtx());
        let set = compute_display_matrices(&[m, rigid]);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_counts() {
        let mut m = skinned();
        m.indices.extend_from_slice(&[2, 1, 0]);
        assert_eq!(compute_vert_tri_counts(&[m.clone(), m]), (12, 4));
    }

    #[test]
    fn test_encode_decode_with_padding() {
        let m = skinned();
        let mut w = Writer::new();
        let mut names = NameTable::new();
        m.write(&mut w, &mut names, 0, 0).unwrap();
        assert_eq!(w.tell(), m.size());
        names.flush(&mut w).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(Mesh::read(&mut Reader::new(&bytes)).unwrap(), m);
    }

    #[test]
    fn test_huge_count_is_eof() {
        let mut w = Writer::new();
        let mut names = NameTable::new();
        Mesh::new("m").write(&mut w, &mut names, 0, 0).unwrap();
        let mut bytes = w.into_bytes();
        bytes[0x1C..0x20].copy_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(Mesh::read(&mut Reader::new(&bytes)), Err(Error::UnexpectedEof(_))));
    }
}
