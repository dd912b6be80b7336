//! Bounds-checked big-endian reader over an in-memory archive.

use byteorder::{BigEndian, ByteOrder};

use crate::util::{Error, Mtx34, Result, Vec2, Vec3};

/// A named byte span `[start, end)` that owns the offsets stored inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

impl Region {
    pub fn new(name: impl Into<String>, start: u32, end: u32) -> Self {
        Self { name: name.into(), start, end }
    }

    /// Size of the span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// True if `addr` lies strictly inside the span.
    #[inline]
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Resolve an offset stored relative to the region start.
    pub fn resolve(&self, offset: i32) -> Result<u32> {
        self.resolve_from(self.start, offset)
    }

    /// Resolve an offset stored relative to an arbitrary base (for example the
    /// address of the offset field itself).
    pub fn resolve_from(&self, base: u32, offset: i32) -> Result<u32> {
        let target = base as i64 + offset as i64;
        if target < self.start as i64 || target >= self.end as i64 {
            return Err(Error::OffsetOutOfRange {
                region: self.name.clone(),
                offset: target,
                start: self.start as u64,
                end: self.end as u64,
            });
        }
        Ok(target as u32)
    }
}

/// Read cursor with absolute positioning.
#[derive(Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: u32,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Total size of the underlying buffer.
    #[inline]
    pub fn len(&self) -> u32 {
        self.data.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Region spanning the whole buffer.
    pub fn whole(&self, name: impl Into<String>) -> Region {
        Region::new(name, 0, self.len())
    }

    #[inline]
    pub fn tell(&self) -> u32 {
        self.pos
    }

    pub fn seek_set(&mut self, pos: u32) -> Result<()> {
        if pos as usize > self.data.len() {
            return Err(Error::UnexpectedEof(pos as u64));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: u32) -> Result<()> {
        self.seek_set(self.pos.saturating_add(n))
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let start = self.pos as usize;
        let end = start
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEof((start + n) as u64))?;
        self.pos = end as u32;
        Ok(&self.data[start..end])
    }

    /// Borrow `n` bytes at an absolute address without moving the cursor.
    pub fn bytes_at(&self, addr: u32, n: usize) -> Result<&'a [u8]> {
        let start = addr as usize;
        start
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .map(|end| &self.data[start..end])
            .ok_or(Error::UnexpectedEof((start + n) as u64))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4)?))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_mtx34(&mut self) -> Result<Mtx34> {
        let mut m = Mtx34::IDENTITY;
        for row in m.rows.iter_mut() {
            for v in row.iter_mut() {
                *v = self.read_f32()?;
            }
        }
        Ok(m)
    }

    /// Read a 4-byte tag and compare it against `magic`.
    pub fn expect_magic(&mut self, magic: &[u8; 4]) -> Result<()> {
        let found = self.take(4)?;
        if found != magic {
            return Err(Error::magic(magic, found));
        }
        Ok(())
    }

    /// Peek the 4-byte tag at the cursor.
    pub fn peek_magic(&self) -> Result<[u8; 4]> {
        let b = self.bytes_at(self.pos, 4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Consume a `magic + u32 size` header and return the section's region.
    pub fn section(&mut self, name: impl Into<String>, magic: &[u8; 4]) -> Result<Region> {
        let start = self.pos;
        self.expect_magic(magic)?;
        let size = self.read_u32()?;
        let end = start
            .checked_add(size)
            .filter(|&end| end <= self.len())
            .ok_or(Error::UnexpectedEof(start as u64 + size as u64))?;
        if size < 8 {
            return Err(Error::invalid(format!(
                "{} section declares size {size}",
                String::from_utf8_lossy(magic)
            )));
        }
        Ok(Region::new(name, start, end))
    }

    /// Run `f` with the cursor at `addr`, restoring the cursor afterwards.
    pub fn at<T>(&mut self, addr: u32, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let back = self.pos;
        self.seek_set(addr)?;
        let out = f(self);
        self.pos = back;
        out
    }

    /// NUL-terminated string at an absolute address.
    pub fn string_at(&self, addr: u32) -> Result<String> {
        let tail = self
            .data
            .get(addr as usize..)
            .ok_or(Error::UnexpectedEof(addr as u64))?;
        let nul = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::invalid(format!("unterminated string at 0x{addr:X}")))?;
        Ok(std::str::from_utf8(&tail[..nul])?.to_string())
    }

    /// Read a name offset relative to `base`; zero means "no name".
    pub fn read_name(&mut self, base: u32) -> Result<String> {
        let ofs = self.read_i32()?;
        if ofs == 0 {
            return Ok(String::new());
        }
        let addr = base as i64 + ofs as i64;
        if addr < 0 || addr >= self.len() as i64 {
            return Err(Error::OffsetOutOfRange {
                region: "string pool".into(),
                offset: addr,
                start: 0,
                end: self.len() as u64,
            });
        }
        self.string_at(addr as u32)
    }
}
