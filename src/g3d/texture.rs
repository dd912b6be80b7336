//! Textures (`TEX0`).
//!
//! Pixel payloads stay in their GPU encoding; conversion to and from RGBA
//! goes through a caller-supplied [`PixelCodec`].
//!
//! ```text
//! 0x00 "TEX0"               0x1C u16 width, 0x1E u16 height
//! 0x04 u32 size             0x20 u32 format
//! 0x08 u32 version (1, 3)   0x24 u32 image count (base + mips)
//! 0x0C s32 archive offset   0x28 f32 min lod, 0x2C f32 max lod
//! 0x10 s32 data offset      0x30 s32 source path offset
//! 0x14 s32 name offset      0x34 padding to 0x40
//! 0x18 u32 flags (bit 0: paletted)
//! ```

use super::gx::{gx_enum, read_enum32};
use crate::io::format::{TEX0_MAGIC, TEX0_VERSION};
use crate::io::{NameTable, Reader, Writer};
use crate::util::{Error, Result};

pub const TEX0_HEADER_SIZE: u32 = 0x40;

const TEX0_FLAG_PALETTED: u32 = 0x1;

gx_enum! {
    pub enum TextureFormat {
        I4 = 0x0,
        I8 = 0x1,
        IA4 = 0x2,
        IA8 = 0x3,
        RGB565 = 0x4,
        RGB5A3 = 0x5,
        #[default] RGBA8 = 0x6,
        C4 = 0x8,
        C8 = 0x9,
        C14X2 = 0xA,
        CMPR = 0xE,
    }
}

impl TextureFormat {
    /// Tile width and height in texels.
    pub fn block_size(self) -> (u32, u32) {
        match self {
            Self::I4 | Self::C4 | Self::CMPR => (8, 8),
            Self::I8 | Self::IA4 | Self::C8 => (8, 4),
            _ => (4, 4),
        }
    }

    pub fn bits_per_pixel(self) -> u32 {
        match self {
            Self::I4 | Self::C4 | Self::CMPR => 4,
            Self::I8 | Self::IA4 | Self::C8 => 8,
            Self::RGBA8 => 32,
            _ => 16,
        }
    }

    pub fn is_paletted(self) -> bool {
        matches!(self, Self::C4 | Self::C8 | Self::C14X2)
    }

    /// Encoded byte size of one `width` x `height` image, padded to whole tiles.
    pub fn image_size(self, width: u32, height: u32) -> u32 {
        let (bw, bh) = self.block_size();
        let w = width.div_ceil(bw) * bw;
        let h = height.div_ceil(bh) * bh;
        w * h * self.bits_per_pixel() / 8
    }
}

/// External texel codec. Implementations convert between a GPU encoding and
/// tightly packed RGBA8.
pub trait PixelCodec {
    fn decode(&self, format: TextureFormat, width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>>;

    fn encode(&self, format: TextureFormat, width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    pub source_path: String,
    pub format: TextureFormat,
    pub width: u16,
    pub height: u16,
    /// Number of images including the base level.
    pub image_count: u32,
    pub min_lod: f32,
    pub max_lod: f32,
    /// Encoded texels of every level, base first.
    pub data: Vec<u8>,
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            name: String::new(),
            source_path: String::new(),
            format: TextureFormat::RGBA8,
            width: 0,
            height: 0,
            image_count: 1,
            min_lod: 0.0,
            max_lod: 0.0,
            data: Vec::new(),
        }
    }
}

impl Texture {
    /// Encode a single-level texture from RGBA8 texels.
    pub fn from_rgba(
        name: impl Into<String>,
        format: TextureFormat,
        width: u16,
        height: u16,
        rgba: &[u8],
        codec: &dyn PixelCodec,
    ) -> Result<Self> {
        let expected = 4 * width as usize * height as usize;
        if rgba.len() != expected {
            return Err(Error::other(format!("RGBA buffer has {} bytes, expected {expected}", rgba.len())));
        }
        let data = codec.encode(format, width as u32, height as u32, rgba)?;
        Ok(Self { name: name.into(), format, width, height, data, ..Default::default() })
    }

    /// Payload size the header implies, all levels included.
    pub fn expected_data_size(&self) -> u32 {
        (0..self.image_count.max(1))
            .map(|level| {
                let w = (self.width as u32 >> level).max(1);
                let h = (self.height as u32 >> level).max(1);
                self.format.image_size(w, h)
            })
            .sum()
    }

    /// Base level as RGBA8.
    pub fn decode_rgba(&self, codec: &dyn PixelCodec) -> Result<Vec<u8>> {
        let base = self.format.image_size(self.width as u32, self.height as u32) as usize;
        let data = self
            .data
            .get(..base)
            .ok_or_else(|| Error::invalid(format!("texture {} holds {} of {base} bytes", self.name, self.data.len())))?;
        codec.decode(self.format, self.width as u32, self.height as u32, data)
    }

    pub fn size(&self) -> u32 {
        TEX0_HEADER_SIZE + self.data.len() as u32
    }

    /// Decode a sub-file at the cursor. Version 1 and 3 headers are accepted.
    pub fn read(r: &mut Reader<'_>) -> Result<Self> {
        let region = r.section("TEX0", TEX0_MAGIC)?;
        let version = r.read_u32()?;
        if version != 1 && version != TEX0_VERSION {
            return Err(Error::UnsupportedVersion { section: "TEX0", version });
        }
        let _brres_ofs = r.read_i32()?;
        let data_ofs = r.read_i32()?;
        // An empty payload points one past the end of the section
        let data_addr = if data_ofs as i64 == region.len() as i64 {
            region.end
        } else {
            region.resolve(data_ofs)?
        };
        let name = r.read_name(region.start)?;
        let _flags = r.read_u32()?;
        let width = r.read_u16()?;
        let height = r.read_u16()?;
        let format = read_enum32(r, "texture format", TextureFormat::from_u8)?;
        let image_count = r.read_u32()?;
        let min_lod = r.read_f32()?;
        let max_lod = r.read_f32()?;
        let source_path = r.read_name(region.start)?;
        let data = r.bytes_at(data_addr, (region.end - data_addr) as usize)?.to_vec();

        Ok(Self {
            name,
            source_path,
            format,
            width,
            height,
            image_count,
            min_lod,
            max_lod,
            data,
        })
    }

    pub fn write(&self, w: &mut Writer, names: &mut NameTable, brres_start: u32) -> Result<()> {
        let mut s = w.section(TEX0_MAGIC)?;
        let start = s.start();
        s.write_u32(TEX0_VERSION)?;
        s.write_offset(brres_start, start)?;
        s.write_i32(TEX0_HEADER_SIZE as i32)?;
        names.write_ref(&mut s, start, &self.name)?;
        s.write_u32(if self.format.is_paletted() { TEX0_FLAG_PALETTED } else { 0 })?;
        s.write_u16(self.width)?;
        s.write_u16(self.height)?;
        s.write_u32(self.format.to_u8() as u32)?;
        s.write_u32(self.image_count)?;
        s.write_f32(self.min_lod)?;
        s.write_f32(self.max_lod)?;
        names.write_ref(&mut s, start, &self.source_path)?;
        s.write_zeros((TEX0_HEADER_SIZE - 0x34) as usize)?;
        s.write_bytes(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Grey I8 codec: one luminance byte per texel, row-major, no tiling.
    struct Luma;

    impl PixelCodec for Luma {
        fn decode(&self, _: TextureFormat, _: u32, _: u32, data: &[u8]) -> Result<Vec<u8>> {
            Ok(data.iter().flat_map(|&l| [l, l, l, 0xFF]).collect())
        }

        fn encode(&self, format: TextureFormat, w: u32, h: u32, rgba: &[u8]) -> Result<Vec<u8>> {
            let mut out: Vec<u8> = rgba.chunks_exact(4).map(|px| px[0]).collect();
            out.resize(format.image_size(w, h) as usize, 0);
            Ok(out)
        }
    }

    #[test]
    fn test_image_sizes() {
        assert_eq!(TextureFormat::CMPR.image_size(64, 64), 2048);
        assert_eq!(TextureFormat::RGBA8.image_size(1, 1), 64);
        assert_eq!(TextureFormat::I8.image_size(8, 4), 32);
        let t = Texture { format: TextureFormat::I4, width: 16, height: 16, image_count: 3, ..Default::default() };
        // 16x16 -> 128, 8x8 -> 32, 4x4 padded to 8x8 -> 32
        assert_eq!(t.expected_data_size(), 192);
    }

    #[test]
    fn test_codec_and_header() {
        let rgba: Vec<u8> = (0..32u8).flat_map(|i| [i, i, i, 0xFF]).collect();
        let mut tex = Texture::from_rgba("grey", TextureFormat::I8, 8, 4, &rgba, &Luma).unwrap();
        tex.source_path = "grey.png".into();
        assert_eq!(tex.data.len() as u32, tex.expected_data_size());
        assert_eq!(tex.decode_rgba(&Luma).unwrap(), rgba);

        let mut w = Writer::new();
        let mut names = NameTable::new();
        tex.write(&mut w, &mut names, 0).unwrap();
        assert_eq!(w.tell(), tex.size());
        names.flush(&mut w).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(Texture::read(&mut Reader::new(&bytes)).unwrap(), tex);
    }

    #[test]
    fn test_rejects_short_rgba() {
        assert!(Texture::from_rgba("t", TextureFormat::I8, 8, 4, &[0; 4], &Luma).is_err());
    }
}
