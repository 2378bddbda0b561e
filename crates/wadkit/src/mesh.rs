//! Mesh vertex streams.

use std::sync::Arc;

use wadkit_vif::{VertexBlock, VifDecoder};
use wadkit_wad::{Payload, Registry};

/// Mesh payload format tag.
///
/// Read as a VIF code this is a NOP, so the whole payload decodes as one
/// stream.
pub const MESH_MAGIC: u32 = 0x0001_000f;

/// Vertex blocks of one mesh payload.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeshStream {
    pub blocks: Vec<VertexBlock>,
}

impl MeshStream {
    /// Total vertices over all blocks.
    pub fn vertex_count(&self) -> usize {
        self.blocks.iter().map(VertexBlock::vertex_count).sum()
    }
}

/// Register the mesh stream decoder for [`MESH_MAGIC`].
pub fn register_mesh_stream(registry: &mut Registry) -> &mut Registry {
    registry.register(MESH_MAGIC, |_wad, node, reader| {
        let blocks = VifDecoder::new(reader.as_bytes())
            .with_base_offset(node.byte_range().start)
            .decode()?;
        tracing::debug!("mesh {} decoded {} blocks", node.id(), blocks.len());
        Ok(Arc::new(MeshStream { blocks }) as Payload)
    })
}
