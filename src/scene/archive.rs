//! The editable scene archive and its entry points.
//!
//! # Example
//!
//! ```no_run
//! use brres::scene::SceneArchive;
//!
//! let decoded = SceneArchive::open("course_model.brres")?;
//! for msg in decoded.report.messages() {
//!     println!("{msg}");
//! }
//! let encoded = decoded.archive.to_bytes()?;
//! assert!(!encoded.report.is_failure());
//! # Ok::<(), brres::Error>(())
//! ```

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, info};

use super::assemble::{process_model, to_binary_model};
use super::model::Model;
use crate::g3d::{BinaryArchive, SrtAnimation, Texture};
use crate::report::{IoContext, Transaction};
use crate::util::{Error, Result};

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Collapse identical SRT tracks before writing.
    pub dedup_tracks: bool,
    /// Sub-file alignment in bytes, a power of two of at least 4.
    pub alignment: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { dedup_tracks: true, alignment: 0x20 }
    }
}

/// A decoded archive together with everything noticed while decoding.
#[derive(Debug)]
pub struct Decoded {
    pub archive: SceneArchive,
    pub report: Transaction,
}

/// Encoded bytes together with everything noticed while encoding.
#[derive(Debug)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub report: Transaction,
}

/// Models, textures and texture SRT animations of one archive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneArchive {
    pub models: Vec<Model>,
    pub textures: Vec<Texture>,
    pub srt_animations: Vec<SrtAnimation>,
}

impl SceneArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an archive held in memory.
    ///
    /// Structural corruption is returned as `Err`. Anything the decoder could
    /// repair lands in [`Decoded::report`].
    pub fn from_bytes(data: &[u8]) -> Result<Decoded> {
        let mut report = Transaction::new();
        let mut ctx = IoContext::new("brres", &mut report);
        let binary = BinaryArchive::read(data, &mut ctx)?;

        let models = binary
            .models
            .iter()
            .map(|m| process_model(m, &mut ctx.sublet(&format!("MDL0 {}", m.name))))
            .collect();
        let archive = Self { models, textures: binary.textures, srt_animations: binary.srt_animations };
        archive.validate(&mut ctx);

        debug!(failure = report.is_failure(), messages = report.messages().len(), "decoded archive");
        Ok(Decoded { archive, report })
    }

    /// Memory-map and decode a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Decoded> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let size = file.metadata()?.len();
        info!(path = %path.display(), bytes = size, "opening archive");
        if size == 0 {
            return Self::from_bytes(&[]);
        }
        // Safety: read-only mapping, dropped before returning
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
        Self::from_bytes(&mmap)
    }

    pub fn to_bytes(&self) -> Result<Encoded> {
        self.to_bytes_with(&EncodeOptions::default())
    }

    pub fn to_bytes_with(&self, options: &EncodeOptions) -> Result<Encoded> {
        let mut report = Transaction::new();
        let mut ctx = IoContext::new("brres", &mut report);
        self.validate(&mut ctx);

        let models = self
            .models
            .iter()
            .map(|m| to_binary_model(m, &mut ctx.sublet(&format!("MDL0 {}", m.name))))
            .collect::<Result<Vec<_>>>()?;
        let mut srt_animations = self.srt_animations.clone();
        if options.dedup_tracks {
            srt_animations.iter_mut().for_each(SrtAnimation::dedup_tracks);
        }
        let binary = BinaryArchive { models, textures: self.textures.clone(), srt_animations };
        let bytes = binary.write(options.alignment)?;
        Ok(Encoded { bytes, report })
    }

    /// Encode with default options and write to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<Transaction> {
        let Encoded { bytes, report } = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(path = %path.as_ref().display(), bytes = bytes.len(), "saved archive");
        Ok(report)
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures.iter().find(|t| t.name == name)
    }

    pub fn srt_animation(&self, name: &str) -> Option<&SrtAnimation> {
        self.srt_animations.iter().find(|s| s.name == name)
    }

    /// Cross-file checks: sampler texture links and texture payload sizes.
    fn validate(&self, ctx: &mut IoContext<'_>) {
        for model in &self.models {
            let mut mctx = ctx.sublet(&format!("MDL0 {}", model.name));
            let mut materials = mctx.sublet("materials");
            for mat in &model.materials {
                for tex in mat.texture_names() {
                    materials.sublet(&mat.name).request(
                        self.texture(tex).is_some(),
                        format!("Material {} samples texture {tex}, which is not in the archive", mat.name),
                    );
                }
            }
        }
        for tex in &self.textures {
            let expected = tex.expected_data_size() as usize;
            ctx.sublet(&format!("TEX0 {}", tex.name)).request(
                tex.data.len() >= expected,
                format!(
                    "{}x{} {:?} with {} levels needs {expected} bytes, but only {} are present",
                    tex.width,
                    tex.height,
                    tex.format,
                    tex.image_count,
                    tex.data.len()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::g3d::material::Sampler;
    use crate::g3d::{Material, TextureFormat};
    use crate::scene::Bone;

    fn scene() -> SceneArchive {
        let mut model = Model::new("course");
        model.bones.push(Bone::new("root"));
        model.draw_matrices.push(crate::scene::DrawMatrix::rigid(0));
        SceneArchive { models: vec![model], ..Default::default() }
    }

    #[test]
    fn test_round_trip_clean() {
        let encoded = scene().to_bytes().unwrap();
        assert!(encoded.report.is_clean());
        let decoded = SceneArchive::from_bytes(&encoded.bytes).unwrap();
        assert!(decoded.report.is_clean(), "{:?}", decoded.report.messages());
        assert_eq!(decoded.archive, scene());
    }

    #[test]
    fn test_missing_sampler_texture_warns() {
        let mut archive = scene();
        let mut mat = Material::new("road");
        mat.samplers.push(Sampler { texture: "asphalt".into(), ..Default::default() }).unwrap();
        archive.models[0].materials.push(mat);

        let encoded = archive.to_bytes().unwrap();
        let warnings: Vec<_> = encoded.report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, "brres/MDL0 course/materials/road");
        assert!(!encoded.report.is_failure());
    }

    #[test]
    fn test_short_texture_payload_warns() {
        let mut archive = SceneArchive::new();
        archive.textures.push(Texture {
            name: "sky".into(),
            format: TextureFormat::I8,
            width: 8,
            height: 4,
            data: vec![0; 16],
            ..Default::default()
        });
        let encoded = archive.to_bytes().unwrap();
        assert_eq!(encoded.report.warnings().count(), 1);
    }

    #[test]
    fn test_open_missing_file() {
        let err = SceneArchive::open("/nonexistent/dir/none.brres").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_lookup_by_name() {
        let archive = scene();
        assert!(archive.model("course").is_some());
        assert!(archive.model("sky").is_none());
        assert!(archive.texture("course").is_none());
    }
}
