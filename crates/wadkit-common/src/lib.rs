//! Common utilities for wadkit.
//!
//! This crate provides foundational types and utilities used across all wadkit crates:
//!
//! - [`BinaryReader`] - Bounded, zero-copy binary reading from byte slices
//! - [`hash`] - The game's resource name hash
//! - [`Error`] - Errors shared by every reader in the workspace

mod error;
mod reader;

pub mod hash;

pub use error::{Error, Result};
pub use reader::{trim_name, BinaryReader};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
