//! PS2 VIF vertex stream decoder.
//!
//! Mesh payloads are VIF packet streams as the game's vector unit consumes
//! them. Unpack packets stage attribute buffers (positions, UVs, normals,
//! colors, the joint metadata table, material rows) and a microprogram call
//! flushes the staged buffers into a [`VertexBlock`].
//!
//! # Example
//!
//! ```
//! // V4-16 unpack of one vertex, then MSCAL
//! let stream = [
//!     0x01, 0x00, 0x01, 0x6d, 0x10, 0x00, 0x20, 0x00, 0x30, 0x00, 0x00, 0x00,
//!     0x00, 0x00, 0x00, 0x14,
//! ];
//!
//! let blocks = wadkit_vif::decode(&stream)?;
//! assert_eq!(blocks[0].positions(), &[[1.0, 2.0, 3.0]]);
//! # Ok::<(), wadkit_vif::Error>(())
//! ```

mod block;
mod decoder;
mod error;
mod joints;
pub mod packet;

pub use block::{VertexBlock, NORMAL_SCALE, OPAQUE_ALPHA, POSITION_SCALE, UV_SCALE};
pub use decoder::{decode, VifDecoder};
pub use error::{Error, Result};
pub use joints::META_ROW_SIZE;
pub use packet::{Command, Packet, Role, Unpack, UvForm, VifReader};
