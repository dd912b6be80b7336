//! The `bres` container: header, root folder dictionary and sub-files.
//!
//! ```text
//! 0x00 "bres"  0x04 u16 byte order mark  0x06 u16 padding
//! 0x08 u32 file size  0x0C u16 root offset  0x0E u16 section count
//! 0x10 "root"  u32 size  folder dictionary, one dictionary per folder
//! sub-files, each aligned, then the shared string pool
//! ```

use tracing::{debug, info};

use super::model::BinaryModel;
use super::srt::SrtAnimation;
use super::texture::Texture;
use crate::io::format::{
    align_up, BRRES_HEADER_SIZE, BRRES_MAGIC, BYTE_ORDER_MARK, FOLDER_MODELS, FOLDER_SRT, FOLDER_TEXTURES,
    ROOT_HEADER_SIZE, ROOT_MAGIC,
};
use crate::io::{calc_dictionary_size, Dictionary, NameTable, Reader, Region, Writer};
use crate::report::IoContext;
use crate::util::{Error, Result};

/// Every sub-file of an archive in its on-disk shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinaryArchive {
    pub models: Vec<BinaryModel>,
    pub textures: Vec<Texture>,
    pub srt_animations: Vec<SrtAnimation>,
}

/// Addresses of the root section and each sub-file.
struct Layout {
    folders: Vec<(&'static str, u32)>,
    root_end: u32,
    models: Vec<u32>,
    textures: Vec<u32>,
    srts: Vec<u32>,
}

impl BinaryArchive {
    fn subfile_count(&self) -> usize {
        self.models.len() + self.textures.len() + self.srt_animations.len()
    }

    fn layout(&self, alignment: u32) -> Layout {
        let counts = [
            (FOLDER_MODELS, self.models.len()),
            (FOLDER_TEXTURES, self.textures.len()),
            (FOLDER_SRT, self.srt_animations.len()),
        ];
        let used: Vec<_> = counts.into_iter().filter(|(_, n)| *n > 0).collect();
        let mut accum = BRRES_HEADER_SIZE + ROOT_HEADER_SIZE + calc_dictionary_size(used.len());
        let folders = used
            .iter()
            .map(|&(name, n)| {
                let addr = accum;
                accum += calc_dictionary_size(n);
                (name, addr)
            })
            .collect();
        let root_end = accum;

        let mut place = |sizes: Vec<u32>| -> Vec<u32> {
            sizes
                .into_iter()
                .map(|size| {
                    accum = align_up(accum, alignment);
                    let addr = accum;
                    accum += size;
                    addr
                })
                .collect()
        };
        let models = place(self.models.iter().map(BinaryModel::size).collect());
        let textures = place(self.textures.iter().map(Texture::size).collect());
        let srts = place(self.srt_animations.iter().map(SrtAnimation::size).collect());
        Layout { folders, root_end, models, textures, srts }
    }

    /// Decode an archive. Structural corruption fails outright; inconsistencies
    /// inside sub-files are reported to `ctx`.
    pub fn read(data: &[u8], ctx: &mut IoContext<'_>) -> Result<Self> {
        let mut r = Reader::new(data);
        r.expect_magic(BRRES_MAGIC)?;
        let bom = r.read_u16()?;
        if bom != BYTE_ORDER_MARK {
            return Err(Error::invalid(format!("byte order mark 0x{bom:04X}, only big-endian archives exist")));
        }
        r.skip(2)?;
        let file_size = r.read_u32()?;
        if file_size > r.len() {
            return Err(Error::UnexpectedEof(file_size as u64));
        }
        let root_ofs = r.read_u16()? as u32;
        let section_count = r.read_u16()? as usize;
        let file = Region::new("brres", 0, file_size);

        r.seek_set(root_ofs)?;
        let root = r.section("root", ROOT_MAGIC)?;
        let folders = Dictionary::read(&mut r, &root, None)?;

        let mut archive = Self::default();
        let mut listed = 0;
        for (folder, addr) in folders.entries() {
            r.seek_set(addr)?;
            let dict = Dictionary::read(&mut r, &file, None)?;
            listed += dict.len();
            for (name, addr) in dict.entries() {
                r.seek_set(addr)?;
                let got = match folder {
                    FOLDER_MODELS => {
                        let model = BinaryModel::read(&mut r, &mut ctx.sublet(&format!("MDL0 {name}")))?;
                        let got = model.name.clone();
                        archive.models.push(model);
                        got
                    }
                    FOLDER_TEXTURES => {
                        let tex = Texture::read(&mut r)?;
                        let got = tex.name.clone();
                        archive.textures.push(tex);
                        got
                    }
                    FOLDER_SRT => {
                        let srt = SrtAnimation::read(&mut r, &mut ctx.sublet(&format!("SRT0 {name}")))?;
                        let got = srt.name.clone();
                        archive.srt_animations.push(srt);
                        got
                    }
                    _ => continue,
                };
                ctx.request(got == name, format!("{folder} entry {name} holds a sub-file named {got}"));
            }
            if ![FOLDER_MODELS, FOLDER_TEXTURES, FOLDER_SRT].contains(&folder) {
                ctx.warn(format!("folder {folder} ({} entries) is not supported and was skipped", dict.len()));
            }
        }
        ctx.request(
            section_count == listed + 1,
            format!("header declares {section_count} sections, folders list {}", listed + 1),
        );
        debug!(
            models = archive.models.len(),
            textures = archive.textures.len(),
            srts = archive.srt_animations.len(),
            "read brres"
        );
        Ok(archive)
    }

    /// Encode with sub-files aligned to `alignment` bytes (a power of two, at
    /// least 4).
    pub fn write(&self, alignment: usize) -> Result<Vec<u8>> {
        if !alignment.is_power_of_two() || alignment < 4 {
            return Err(Error::other(format!("sub-file alignment {alignment} is not a power of two >= 4")));
        }
        let section_count = u16::try_from(self.subfile_count() + 1)
            .map_err(|_| Error::WriteFailed(format!("{} sub-files", self.subfile_count())))?;
        let layout = self.layout(alignment as u32);
        let mut w = Writer::new();
        let mut names = NameTable::new();

        w.write_bytes(BRRES_MAGIC)?;
        w.write_u16(BYTE_ORDER_MARK)?;
        w.write_u16(0)?;
        w.write_u32(0)?;
        w.write_u16(BRRES_HEADER_SIZE as u16)?;
        w.write_u16(section_count)?;

        {
            let mut root = w.section(ROOT_MAGIC)?;
            Dictionary::from_entries(layout.folders.iter().copied())?.write(&mut root, &mut names)?;
            for &(folder, _) in &layout.folders {
                let dict = match folder {
                    FOLDER_MODELS => Dictionary::from_entries(
                        self.models.iter().map(|m| m.name.as_str()).zip(layout.models.iter().copied()),
                    ),
                    FOLDER_TEXTURES => Dictionary::from_entries(
                        self.textures.iter().map(|t| t.name.as_str()).zip(layout.textures.iter().copied()),
                    ),
                    _ => Dictionary::from_entries(
                        self.srt_animations.iter().map(|s| s.name.as_str()).zip(layout.srts.iter().copied()),
                    ),
                }?;
                dict.write(&mut root, &mut names)?;
            }
            if root.tell() != layout.root_end {
                return Err(Error::WriteFailed(format!(
                    "root section laid out to 0x{:X} but wrote to 0x{:X}",
                    layout.root_end,
                    root.tell()
                )));
            }
        }

        for model in &self.models {
            w.align(alignment)?;
            model.write(&mut w, &mut names, 0)?;
        }
        for tex in &self.textures {
            w.align(alignment)?;
            tex.write(&mut w, &mut names, 0)?;
        }
        for srt in &self.srt_animations {
            w.align(alignment)?;
            srt.write(&mut w, &mut names, 0)?;
        }
        w.align(4)?;
        names.flush(&mut w)?;
        let file_size = w.len();
        w.patch_u32(8, file_size)?;
        info!(bytes = file_size, sections = section_count, "wrote brres");
        Ok(w.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Transaction;

    fn sample() -> BinaryArchive {
        let mut srt = SrtAnimation::new("scroll");
        srt.frame_duration = 60;
        BinaryArchive {
            models: vec![BinaryModel::new("course"), BinaryModel::new("sky")],
            textures: vec![Texture { name: "grass".into(), data: vec![0; 64], width: 1, height: 1, ..Default::default() }],
            srt_animations: vec![srt],
        }
    }

    #[test]
    fn test_header_and_alignment() {
        let archive = sample();
        let bytes = archive.write(0x20).unwrap();
        assert_eq!(&bytes[..4], b"bres");
        assert_eq!(u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize, bytes.len());
        assert_eq!(u16::from_be_bytes([bytes[14], bytes[15]]), 5);

        let layout = archive.layout(0x20);
        for addr in layout.models.iter().chain(&layout.textures).chain(&layout.srts) {
            assert_eq!(addr % 0x20, 0);
        }
        assert_eq!(&bytes[layout.textures[0] as usize..][..4], b"TEX0");

        let mut tx = Transaction::new();
        let back = BinaryArchive::read(&bytes, &mut IoContext::new("test", &mut tx)).unwrap();
        assert!(tx.is_clean(), "{:?}", tx.messages());
        assert_eq!(back, archive);
    }

    #[test]
    fn test_empty_archive() {
        let bytes = BinaryArchive::default().write(0x20).unwrap();
        let mut tx = Transaction::new();
        let back = BinaryArchive::read(&bytes, &mut IoContext::new("empty", &mut tx)).unwrap();
        assert_eq!(back, BinaryArchive::default());
    }

    #[test]
    fn test_bad_magic_and_truncation() {
        let mut tx = Transaction::new();
        let mut ctx = IoContext::new("x", &mut tx);
        let err = BinaryArchive::read(b"RARC\xFE\xFF\0\0", &mut ctx).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));

        let bytes = sample().write(0x20).unwrap();
        let err = BinaryArchive::read(&bytes[..bytes.len() / 2], &mut ctx).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_rejects_odd_alignment() {
        assert!(sample().write(24).is_err());
    }
}
