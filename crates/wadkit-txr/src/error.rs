//! Error types for texture decoding.

use thiserror::Error;

/// Errors that can occur when decoding a texture header.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] wadkit_common::Error),

    /// Positive LOD coefficient.
    #[error("unknown coefficient {0}")]
    Coefficient(i32),

    /// First flag word outside {0, 0x8000}.
    #[error("unknown flags1 {0:#06x}")]
    Flags1(u16),

    /// Second flag word outside the known set.
    #[error("unknown flags2 {0:#06x} (expected one of 0x01, 0x11, 0x41, 0x51, 0x5d)")]
    Flags2(u16),

    /// Graphics or palette name that does not resolve from the texture node.
    #[error("cannot find {kind} {name:?}: {source}")]
    Unresolved {
        kind: &'static str,
        name: String,
        #[source]
        source: wadkit_wad::Error,
    },
}

/// Result type for texture decoding.
pub type Result<T> = std::result::Result<T, Error>;
