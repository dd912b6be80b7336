//! Editable scene graph.
//!
//! [`SceneArchive`] is what callers work with. Decoding goes through
//! [`g3d::BinaryArchive`](crate::g3d::BinaryArchive) and then
//! [`assemble`] rebuilds hierarchy, draw matrices and draw calls from the
//! model bytecode. Encoding runs the same steps in reverse.

pub mod archive;
pub mod assemble;
pub mod model;

pub use archive::{Decoded, EncodeOptions, Encoded, SceneArchive};
pub use model::{Bone, Display, DrawMatrix, MatrixWeight, Model};
