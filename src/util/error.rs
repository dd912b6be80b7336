//! Error types for the BRRES codec.
//!
//! Every variant here is a hard failure: decoding stops and no scene graph is
//! returned. Recoverable problems (bad indices, count mismatches, flag
//! disagreements) are not errors in this sense; they are collected in a
//! [`Transaction`](crate::report::Transaction) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for BRRES operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Section magic did not match
    #[error("Invalid magic: expected {expected:?}, found {found:?}")]
    InvalidMagic { expected: String, found: String },

    /// Section version is not understood
    #[error("Unsupported {section} version {version}")]
    UnsupportedVersion { section: &'static str, version: u32 },

    /// Buffer is truncated
    #[error("Unexpected end of data at position {0}")]
    UnexpectedEof(u64),

    /// An offset resolved outside the region that owns it
    #[error("Offset 0x{offset:X} escapes region {region} [0x{start:X}, 0x{end:X})")]
    OffsetOutOfRange {
        region: String,
        offset: i64,
        start: u64,
        end: u64,
    },

    /// Invalid data structure in file
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// Write operation failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a magic mismatch error from raw tags.
    pub fn magic(expected: &[u8], found: &[u8]) -> Self {
        Self::InvalidMagic {
            expected: String::from_utf8_lossy(expected).into_owned(),
            found: String::from_utf8_lossy(found).into_owned(),
        }
    }

    /// True for errors caused by the bytes being decoded rather than by the
    /// environment (file system, encoder state).
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. }
                | Self::UnsupportedVersion { .. }
                | Self::UnexpectedEof(_)
                | Self::OffsetOutOfRange { .. }
                | Self::InvalidStructure(_)
                | Self::Utf8(_)
        )
    }
}

/// Result type alias for BRRES operations.
pub type Result<T> = std::result::Result<T, Error>;
