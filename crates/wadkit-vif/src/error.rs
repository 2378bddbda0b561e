//! Error types for vertex stream decoding.

use thiserror::Error;

use crate::packet::Role;

/// Errors that can occur while decoding a vertex stream.
///
/// Offsets are absolute: the decoder's base offset plus the position of the
/// offending packet in the stream.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] wadkit_common::Error),

    /// A packet or its payload runs past the end of the stream.
    #[error("packet at {offset:#x} needs {needed} bytes, {available} left")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Control code outside the supported set.
    #[error("unknown VIF command {cmd:#04x} at {offset:#x} (num {num:#04x}, imm {imm:#06x})")]
    UnknownCommand {
        offset: usize,
        cmd: u8,
        num: u8,
        imm: u16,
    },

    /// Unpack whose format matches no attribute role.
    #[error(
        "unpack at {offset:#x} not handled (cmd {cmd:#04x}; {width} bit; {components} components; \
         {num} elements; signed {signed}; target {target:#05x})"
    )]
    UnknownUnpack {
        offset: usize,
        cmd: u8,
        width: u8,
        components: u8,
        num: u8,
        signed: bool,
        target: u16,
    },

    /// A second buffer for a role staged before the flush.
    #[error("{role} already staged when unpack at {offset:#x} arrived")]
    DuplicateRole { role: Role, offset: usize },

    /// Joint runs do not cover the block's vertices exactly.
    #[error("joint runs cover {runs} vertices, block has {vertices}")]
    JointRunMismatch { runs: usize, vertices: usize },

    /// Last-row flag set on the wrong metadata row, or missing.
    #[error("metadata row {row} of {rows} has a misplaced last-row flag")]
    TerminalFlag { row: usize, rows: usize },
}

/// Result type for vertex stream decoding.
pub type Result<T> = std::result::Result<T, Error>;
