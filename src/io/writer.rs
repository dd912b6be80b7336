//! Big-endian writer over a growable buffer.
//!
//! Layout is computed top-down, so most offsets are known before the bytes
//! they point at exist. Where they are not, fields are reserved and patched
//! later with [`Writer::patch_u32`] / [`Writer::patch_i32`].

use std::io::{Cursor, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::util::{Error, Mtx34, Result, Vec2, Vec3};

/// Output buffer for a whole archive.
#[derive(Default)]
pub struct Writer {
    buf: Cursor<Vec<u8>>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current write position.
    #[inline]
    pub fn tell(&self) -> u32 {
        self.buf.position() as u32
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> u32 {
        self.buf.get_ref().len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.get_ref().is_empty()
    }

    /// Move the cursor to an absolute position.
    pub fn seek_set(&mut self, pos: u32) -> Result<()> {
        self.buf.seek(SeekFrom::Start(pos as u64))?;
        Ok(())
    }

    /// Move the cursor to the end of the written data.
    pub fn seek_end(&mut self) -> Result<u32> {
        Ok(self.buf.seek(SeekFrom::End(0))? as u32)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.buf.write_all(data)?;
        Ok(())
    }

    pub fn write_zeros(&mut self, n: usize) -> Result<()> {
        self.write_bytes(&vec![0u8; n])
    }

    /// Pad with zeros until the cursor is a multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let pos = self.tell() as usize;
        let pad = (alignment - pos % alignment) % alignment;
        self.write_zeros(pad)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.buf.write_u8(value)?;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.buf.write_i8(value)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.buf.write_u16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.buf.write_i16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.buf.write_u32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.buf.write_i32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.buf.write_f32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_vec2(&mut self, v: Vec2) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)
    }

    pub fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)?;
        self.write_f32(v.z)
    }

    pub fn write_mtx34(&mut self, m: &Mtx34) -> Result<()> {
        for &v in m.as_floats() {
            self.write_f32(v)?;
        }
        Ok(())
    }

    /// Write a signed offset from `base` to `target`.
    pub fn write_offset(&mut self, target: u32, base: u32) -> Result<()> {
        self.write_i32(super::format::rel(target, base))
    }

    /// Overwrite an already-written u32 without moving the cursor.
    pub fn patch_u32(&mut self, at: u32, value: u32) -> Result<()> {
        let slot = self
            .buf
            .get_mut()
            .get_mut(at as usize..at as usize + 4)
            .ok_or_else(|| Error::WriteFailed(format!("patch at 0x{at:X} past end of buffer")))?;
        BigEndian::write_u32(slot, value);
        Ok(())
    }

    pub fn patch_i32(&mut self, at: u32, value: i32) -> Result<()> {
        self.patch_u32(at, value as u32)
    }

    /// Emit `magic` and a placeholder size, returning a scope that patches
    /// the size when it ends.
    pub fn section(&mut self, magic: &[u8; 4]) -> Result<SizedScope<'_>> {
        let start = self.tell();
        self.write_bytes(magic)?;
        self.write_u32(0)?;
        Ok(SizedScope { start, size_field: start + 4, writer: self })
    }

    /// Open a scope starting at the cursor whose size lands in the u32 at
    /// `start + size_field`. The field must be written inside the scope.
    pub fn sized_scope(&mut self, size_field: u32) -> SizedScope<'_> {
        let start = self.tell();
        SizedScope { start, size_field: start + size_field, writer: self }
    }

    /// Consume the writer and return the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_inner()
    }
}

/// Guard that records the size of everything written between its creation
/// and its drop into a leading size field.
///
/// The patch runs from `Drop`, so it also happens when the code filling the
/// scope bails out early with `?`.
pub struct SizedScope<'w> {
    writer: &'w mut Writer,
    start: u32,
    size_field: u32,
}

impl SizedScope<'_> {
    /// Absolute address where the scope began.
    #[inline]
    pub fn start(&self) -> u32 {
        self.start
    }
}

impl Deref for SizedScope<'_> {
    type Target = Writer;

    fn deref(&self) -> &Writer {
        self.writer
    }
}

impl DerefMut for SizedScope<'_> {
    fn deref_mut(&mut self) -> &mut Writer {
        self.writer
    }
}

impl Drop for SizedScope<'_> {
    fn drop(&mut self) {
        let size = self.writer.tell().saturating_sub(self.start);
        // A scope abandoned before its size field was written has nothing to patch.
        let _ = self.writer.patch_u32(self.size_field, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_writes() {
        let mut w = Writer::new();
        w.write_u16(0xFEFF).unwrap();
        w.write_f32(1.0).unwrap();
        w.write_i8(-1).unwrap();
        assert_eq!(w.into_bytes(), vec![0xFE, 0xFF, 0x3F, 0x80, 0, 0, 0xFF]);
    }

    #[test]
    fn test_section_patches_size() {
        let mut w = Writer::new();
        w.write_zeros(4).unwrap();
        {
            let mut s = w.section(b"TEX0").unwrap();
            s.write_u32(3).unwrap();
            s.write_zeros(4).unwrap();
        }
        let bytes = w.into_bytes();
        assert_eq!(&bytes[4..8], b"TEX0");
        assert_eq!(u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]), 16);
    }

    #[test]
    fn test_size_patched_on_early_return() {
        fn fill(w: &mut Writer) -> Result<()> {
            let mut s = w.section(b"MDL0")?;
            s.write_zeros(8)?;
            Err(Error::other("abort halfway"))
        }

        let mut w = Writer::new();
        assert!(fill(&mut w).is_err());
        let bytes = w.into_bytes();
        assert_eq!(u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 16);
    }

    #[test]
    fn test_align_and_patch() {
        let mut w = Writer::new();
        w.write_u8(1).unwrap();
        w.align(4).unwrap();
        assert_eq!(w.tell(), 4);
        w.align(4).unwrap();
        assert_eq!(w.tell(), 4);
        w.write_u32(0).unwrap();
        w.patch_i32(4, -8).unwrap();
        assert!(w.patch_u32(6, 0).is_err());
        let bytes = w.into_bytes();
        assert_eq!(i32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), -8);
    }
}
