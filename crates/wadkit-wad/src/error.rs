//! Error types for the WAD crate.

use thiserror::Error;

use crate::NodeId;

/// Boxed error returned by format decoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when working with WAD archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] wadkit_common::Error),

    /// Record tag outside the known tag table.
    #[error("unknown record tag {tag:#06x} at {offset:#x} (size {size:#x}, name {name:?})")]
    UnknownTag {
        tag: u16,
        offset: usize,
        size: u32,
        name: String,
    },

    /// Group end record with no open group.
    #[error("group end at {offset:#x} without a matching group start")]
    UnbalancedGroupEnd { offset: usize },

    /// Archive ends in the middle of a record header.
    #[error("truncated record header at {offset:#x}: {available} of 32 bytes present")]
    TruncatedRecord { offset: usize, available: usize },

    /// Payload extends past the end of the archive.
    #[error("payload at {offset:#x} of {size:#x} bytes runs past the archive end ({len:#x})")]
    TruncatedPayload { offset: usize, size: u32, len: usize },

    /// Node id outside the node table.
    #[error("node {0} does not exist")]
    NodeOutOfRange(NodeId),

    /// Name lookup exhausted every enclosing scope.
    #[error("name {name:?} not found from scope {scope}")]
    NotFound { name: String, scope: String },

    /// Link chain revisits a node.
    #[error("link {id} ({name:?}) resolves through a cycle")]
    CyclicLink { id: NodeId, name: String },

    /// No decoder registered for a node's format tag.
    #[error("no decoder for format {format:#010x} of node {id} ({name:?})")]
    NoDecoder {
        id: NodeId,
        name: String,
        format: u32,
    },

    /// Decoder failed on a node.
    #[error("decoding node {id} ({name:?}) failed: {source}")]
    Decode {
        id: NodeId,
        name: String,
        #[source]
        source: BoxError,
    },

    /// Decoded payload is not of the requested type.
    #[error("node {id} decoded to a payload that is not a {expected}")]
    UnexpectedType { id: NodeId, expected: &'static str },
}

/// Result type for WAD operations.
pub type Result<T> = std::result::Result<T, Error>;
