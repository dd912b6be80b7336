//! On-disk block codecs.
//!
//! Types here mirror the binary layout one to one: indices instead of
//! references, stored counts and flags as found. The [`scene`](crate::scene)
//! module turns them into the editable graph and back.

pub mod archive;
pub mod bone;
pub mod bytecode;
pub mod gx;
pub mod material;
pub mod mesh;
pub mod model;
pub mod srt;
pub mod tex_matrix;
pub mod texture;

pub use archive::BinaryArchive;
pub use bone::{BinaryBone, Billboard};
pub use bytecode::{BlendMatrix, ByteCodeMethod, Command};
pub use material::Material;
pub use mesh::Mesh;
pub use model::{BinaryModel, EnvelopeMatrixMode, ModelInfo, ScalingRule, TexMatrixMode};
pub use srt::{
    AnimationWrapMode, Keyframe, SrtAnimation, SrtAttribute, SrtBinding, SrtMaterial, SrtMatrix, SrtTarget, SrtTrack,
};
pub use tex_matrix::{MappingMethod, MappingOption, TexMatrix, TransformModel};
pub use texture::{PixelCodec, Texture, TextureFormat};
