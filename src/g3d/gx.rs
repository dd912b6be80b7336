//! Fixed-function GPU state enums and colors.
//!
//! Values are the hardware register encodings, stored on disk as one byte.

use crate::io::Reader;
use crate::util::{Error, Result};

/// Byte-backed enum with checked decoding. Unknown values are malformed
/// input.
macro_rules! gx_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $name {
            /// Decode from the register value.
            pub fn from_u8(value: u8) -> $crate::util::Result<Self> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err($crate::util::Error::invalid(format!(
                        concat!("unknown ", stringify!($name), " value {}"),
                        value
                    ))),
                }
            }

            #[inline]
            pub fn to_u8(self) -> u8 {
                self as u8
            }
        }
    };
}

pub(crate) use gx_enum;

/// Decode a [`gx_enum!`] type stored in a 32-bit field.
pub(crate) fn read_enum32<T>(r: &mut Reader<'_>, what: &str, decode: fn(u8) -> Result<T>) -> Result<T> {
    let value = r.read_u32()?;
    u8::try_from(value)
        .map_err(|_| Error::invalid(format!("{what} {value}")))
        .and_then(decode)
}

gx_enum! {
    /// Which faces are discarded.
    pub enum CullMode {
        None = 0,
        Front = 1,
        #[default] Back = 2,
        All = 3,
    }
}

gx_enum! {
    pub enum Compare {
        Never = 0,
        Less = 1,
        Equal = 2,
        LEqual = 3,
        Greater = 4,
        NEqual = 5,
        GEqual = 6,
        #[default] Always = 7,
    }
}

gx_enum! {
    pub enum AlphaOp {
        #[default] And = 0,
        Or = 1,
        Xor = 2,
        Xnor = 3,
    }
}

gx_enum! {
    pub enum BlendModeType {
        #[default] None = 0,
        Blend = 1,
        Logic = 2,
        Subtract = 3,
    }
}

gx_enum! {
    pub enum BlendFactor {
        Zero = 0,
        One = 1,
        SrcColor = 2,
        InvSrcColor = 3,
        #[default] SrcAlpha = 4,
        InvSrcAlpha = 5,
        DstAlpha = 6,
        InvDstAlpha = 7,
    }
}

gx_enum! {
    pub enum LogicOp {
        Clear = 0,
        And = 1,
        RevAnd = 2,
        #[default] Copy = 3,
        InvAnd = 4,
        NoOp = 5,
        Xor = 6,
        Or = 7,
        Nor = 8,
        Equiv = 9,
        Inv = 10,
        RevOr = 11,
        InvCopy = 12,
        InvOr = 13,
        Nand = 14,
        Set = 15,
    }
}

gx_enum! {
    /// Source of a lighting channel's material or ambient color.
    pub enum ColorSource {
        #[default] Register = 0,
        Vertex = 1,
    }
}

gx_enum! {
    pub enum DiffuseFunction {
        #[default] None = 0,
        Sign = 1,
        Clamp = 2,
    }
}

gx_enum! {
    pub enum AttenuationFunction {
        Specular = 0,
        Spotlight = 1,
        #[default] None = 2,
    }
}

gx_enum! {
    /// Texture coordinate generator projection.
    pub enum TexGenType {
        #[default] Matrix3x4 = 0,
        Matrix2x4 = 1,
        Bump0 = 2,
        Bump1 = 3,
        Bump2 = 4,
        Bump3 = 5,
        Bump4 = 6,
        Bump5 = 7,
        Bump6 = 8,
        Bump7 = 9,
        Srtg = 10,
    }
}

gx_enum! {
    /// Texture coordinate generator input.
    pub enum TexGenSrc {
        Position = 0,
        Normal = 1,
        Binormal = 2,
        Tangent = 3,
        #[default] UV0 = 4,
        UV1 = 5,
        UV2 = 6,
        UV3 = 7,
        UV4 = 8,
        UV5 = 9,
        UV6 = 10,
        UV7 = 11,
        BumpUV0 = 12,
        BumpUV1 = 13,
        BumpUV2 = 14,
        BumpUV3 = 15,
        BumpUV4 = 16,
        BumpUV5 = 17,
        BumpUV6 = 18,
        Color0 = 19,
        Color1 = 20,
    }
}

gx_enum! {
    pub enum WrapMode {
        Clamp = 0,
        #[default] Repeat = 1,
        Mirror = 2,
    }
}

gx_enum! {
    pub enum TextureFilter {
        Near = 0,
        #[default] Linear = 1,
        NearMipNear = 2,
        LinMipNear = 3,
        NearMipLin = 4,
        LinMipLin = 5,
    }
}

gx_enum! {
    pub enum Anisotropy {
        #[default] X1 = 0,
        X2 = 1,
        X4 = 2,
    }
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Signed 10-bit-per-channel color used by tev registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorS10 {
    pub r: i16,
    pub g: i16,
    pub b: i16,
    pub a: i16,
}
