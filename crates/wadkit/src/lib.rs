//! Wadkit - God of War resource archive reading and decoding.
//!
//! This crate ties the wadkit crates together and wires the built-in
//! decoders into one registry.
//!
//! # Crates
//!
//! - [`wadkit_common`] - Binary reading, name hash
//! - [`wadkit_wad`] - WAD archive tree, scoped lookup, links, decoder registry
//! - [`wadkit_vif`] - VIF vertex stream decoding
//! - [`wadkit_txr`] - Texture headers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wadkit::prelude::*;
//!
//! let wad = Wad::open("R_PERM.WAD", Arc::new(wadkit::default_registry()))?;
//! let id = wad.lookup(b"MESH_HERO", None)?;
//! let mesh = wad.get_as::<MeshStream>(id)?;
//! println!("{} vertices in {} blocks", mesh.vertex_count(), mesh.blocks.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod mesh;

pub use wadkit_common as common;
pub use wadkit_txr as txr;
pub use wadkit_vif as vif;
pub use wadkit_wad as wad;

pub use mesh::{register_mesh_stream, MeshStream, MESH_MAGIC};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{default_registry, MeshStream};
    pub use wadkit_common::BinaryReader;
    pub use wadkit_txr::Texture;
    pub use wadkit_vif::{VertexBlock, VifDecoder};
    pub use wadkit_wad::{NodeId, Payload, Registry, Wad, WadNode};
}

use wadkit_wad::Registry;

/// Registry with every built-in decoder.
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    wadkit_txr::register(&mut registry);
    register_mesh_stream(&mut registry);
    registry
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
