//! Error types for wadkit-common.

use thiserror::Error;

/// Common error type for wadkit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// A sub-range does not fit inside the buffer.
    #[error("range {offset:#x}+{size:#x} is outside of a {len:#x} byte buffer")]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },

    /// Invalid magic number encountered.
    #[error("invalid magic: expected {expected:#010x}, got {actual:#010x}")]
    InvalidMagic { expected: u32, actual: u32 },
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
