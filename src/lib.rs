//! # BRRES
//!
//! Rust codec for BRRES scene archives: models, textures and texture SRT
//! animations for a fixed-function GPU pipeline, stored big-endian.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math types, fixed-capacity arrays
//! - [`io`] - Byte cursors, regions, name pool, name dictionaries
//! - [`report`] - Path-tagged warnings and errors collected during a transaction
//! - [`g3d`] - On-disk blocks (MDL0, TEX0, SRT0 and their parts)
//! - [`scene`] - Editable scene graph and the archive entry points
//!
//! ## Example
//!
//! ```no_run
//! use brres::prelude::*;
//!
//! let Decoded { archive, report } = SceneArchive::open("map_model.brres")?;
//! if report.is_failure() {
//!     for msg in report.errors() {
//!         eprintln!("{msg}");
//!     }
//! }
//! for model in &archive.models {
//!     println!("{}: {} bones", model.name, model.bones.len());
//! }
//! archive.save("map_model.out.brres")?;
//! # Ok::<(), brres::Error>(())
//! ```

pub mod g3d;
pub mod io;
pub mod report;
pub mod scene;
pub mod util;

// Re-export commonly used types
pub use report::{IoContext, Message, Severity, Transaction};
pub use scene::{Decoded, EncodeOptions, Encoded, SceneArchive};
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::g3d::{PixelCodec, SrtAnimation, Texture, TextureFormat};
    pub use crate::report::{Severity, Transaction};
    pub use crate::scene::{Bone, Decoded, DrawMatrix, EncodeOptions, Encoded, Model, SceneArchive};
    pub use crate::util::{Error, Result};
}
