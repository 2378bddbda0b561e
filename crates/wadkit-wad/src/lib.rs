//! WAD resource archive reader.
//!
//! A WAD archive is a flat stream of 32-byte tagged records. File-data
//! records become nodes; group records nest them into a tree. Zero-sized
//! file-data records are links: aliases resolved by name from the link's own
//! position in the tree, where inner scopes shadow outer ones and only nodes
//! declared earlier are visible.
//!
//! Payload decoding is pluggable. A [`Registry`] maps the first four bytes of
//! a payload (its format tag) to a decoder; [`Wad::get`] resolves links,
//! dispatches to the decoder with a reader bounded to the node's bytes, and
//! caches the result on the node.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wadkit_wad::{Registry, Wad};
//!
//! let mut registry = Registry::new();
//! registry.register(0x0000_0007, |_wad, _node, reader| {
//!     Ok(Arc::new(reader.len()) as wadkit_wad::Payload)
//! });
//!
//! let wad = Wad::open("R_PERM.WAD", Arc::new(registry))?;
//! for (depth, node) in wad.walk() {
//!     println!("{:indent$}{} {}", "", node.id(), node.name_lossy(), indent = depth * 2);
//! }
//! # Ok::<(), wadkit_wad::Error>(())
//! ```

mod archive;
mod builder;
mod error;
mod node;
pub mod record;
mod registry;

pub use archive::{Wad, Walk};
pub use error::{BoxError, Error, Result};
pub use node::{NodeId, WadNode};
pub use registry::{DecodeFn, Payload, Registry, Resource};
