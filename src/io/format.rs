//! BRRES container constants and layout helpers.

/// Archive magic.
pub const BRRES_MAGIC: &[u8; 4] = b"bres";

/// Byte-order mark stored after the magic. Only big-endian files exist.
pub const BYTE_ORDER_MARK: u16 = 0xFEFF;

/// Size of the archive header in bytes.
pub const BRRES_HEADER_SIZE: u32 = 0x10;

/// Magic of the root section holding the folder dictionary.
pub const ROOT_MAGIC: &[u8; 4] = b"root";

/// Size of the root section header (magic + size).
pub const ROOT_HEADER_SIZE: u32 = 8;

pub const MDL0_MAGIC: &[u8; 4] = b"MDL0";
pub const TEX0_MAGIC: &[u8; 4] = b"TEX0";
pub const SRT0_MAGIC: &[u8; 4] = b"SRT0";

pub const MDL0_VERSION: u32 = 11;
pub const TEX0_VERSION: u32 = 3;
pub const SRT0_VERSION: u32 = 5;

/// Folder names inside the root dictionary.
pub const FOLDER_MODELS: &str = "3DModels(NW4R)";
pub const FOLDER_TEXTURES: &str = "Textures(NW4R)";
pub const FOLDER_SRT: &str = "AnmTexSrt(NW4R)";

/// Sub-files are aligned to this boundary.
pub const SUBFILE_ALIGNMENT: usize = 0x20;

/// Round `value` up to a multiple of `align` (power of two).
#[inline]
pub const fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) & !(align - 1)
}

/// Signed delta from `base` to `target`, as stored in offset fields.
#[inline]
pub const fn rel(target: u32, base: u32) -> i32 {
    target.wrapping_sub(base) as i32
}
