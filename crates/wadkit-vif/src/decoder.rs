//! Vertex stream state machine.
//!
//! Unpacks stage attribute buffers; a microprogram call (or the end of the
//! stream) flushes whatever is staged into a [`VertexBlock`]. The game sends
//! one of these shapes between flushes, positions always last:
//!
//! - `xyzw` (GUI)
//! - `rgba, xyzw` (GUI, effects)
//! - `uv, xyzw` (simple models)
//! - `uv, rgba, xyzw` (hand-shaded models)
//! - `uv, norm, rgba, xyzw` (lit models)
//!
//! followed by the vertex metadata table and material rows.

use byteorder::{ByteOrder, LittleEndian};

use crate::block::{VertexBlock, NORMAL_SCALE, OPAQUE_ALPHA, POSITION_SCALE, UV_SCALE};
use crate::joints::expand_joint_runs;
use crate::packet::{Command, Packet, Role, Unpack, UvForm, VifReader};
use crate::{Error, Result};

/// Decoder over one stream.
#[derive(Debug, Clone, Copy)]
pub struct VifDecoder<'a> {
    data: &'a [u8],
    base_offset: usize,
}

impl<'a> VifDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            base_offset: 0,
        }
    }

    /// Report offsets relative to `base_offset` (e.g. the stream's position
    /// in its archive).
    pub fn with_base_offset(mut self, base_offset: usize) -> Self {
        self.base_offset = base_offset;
        self
    }

    /// Packets of the stream, without decoding them.
    pub fn packets(&self) -> VifReader<'a> {
        VifReader::new(self.data, self.base_offset)
    }

    /// Decode the stream into blocks.
    pub fn decode(&self) -> Result<Vec<VertexBlock>> {
        let mut blocks = Vec::new();
        let mut staged = Staged::default();
        let mut end = self.base_offset;

        for packet in self.packets() {
            let packet = packet?;
            tracing::trace!("{:#08x} {}", packet.offset, packet.command);
            end = packet.offset + 4 + packet.payload.len();

            match packet.command {
                Command::Unpack(unpack) => staged.stage(&unpack, &packet)?,
                command if command.is_flush() => {
                    blocks.extend(std::mem::take(&mut staged).flush(packet.offset)?);
                }
                _ => {}
            }
        }

        blocks.extend(staged.flush(end)?);
        tracing::debug!("decoded {} blocks", blocks.len());
        Ok(blocks)
    }
}

/// Decode a whole stream.
pub fn decode(data: &[u8]) -> Result<Vec<VertexBlock>> {
    VifDecoder::new(data).decode()
}

/// Attribute buffers waiting for a flush.
#[derive(Default)]
struct Staged<'a> {
    position: Option<&'a [u8]>,
    uv: Option<(UvForm, &'a [u8])>,
    normal: Option<&'a [u8]>,
    color: Option<&'a [u8]>,
    meta: Option<&'a [u8]>,
    material: Vec<[u32; 4]>,
}

impl<'a> Staged<'a> {
    fn stage(&mut self, unpack: &Unpack, packet: &Packet<'a>) -> Result<()> {
        let role = unpack.role().ok_or(Error::UnknownUnpack {
            offset: packet.offset,
            cmd: unpack.cmd,
            width: unpack.width,
            components: unpack.components,
            num: unpack.num,
            signed: unpack.signed,
            target: unpack.target,
        })?;
        let data = packet.payload;
        let duplicate = Error::DuplicateRole {
            role,
            offset: packet.offset,
        };

        match role {
            Role::Position => fill(&mut self.position, data, duplicate),
            Role::Uv(form) => fill(&mut self.uv, (form, data), duplicate),
            Role::Normal => fill(&mut self.normal, data, duplicate),
            Role::Color => fill(&mut self.color, data, duplicate),
            Role::VertexMeta => fill(&mut self.meta, data, duplicate),
            Role::Material => {
                for row in data.chunks_exact(16) {
                    let mut words = [0u32; 4];
                    LittleEndian::read_u32_into(row, &mut words);
                    tracing::debug!(
                        "{:#08x} material row {:08x?} as floats {:?}",
                        packet.offset,
                        words,
                        words.map(f32::from_bits)
                    );
                    self.material.push(words);
                }
                Ok(())
            }
        }
    }

    /// Combine the staged buffers into a block.
    ///
    /// Without positions nothing is produced and the staged data is dropped.
    fn flush(self, offset: usize) -> Result<Option<VertexBlock>> {
        let Some(position) = self.position else {
            if self.uv.is_some() || self.normal.is_some() || self.color.is_some() {
                tracing::debug!("{offset:#08x} flush without positions drops staged attributes");
            }
            return Ok(None);
        };

        let mut block = VertexBlock {
            offset,
            ..VertexBlock::default()
        };

        for vertex in position.chunks_exact(8) {
            block.positions.push([
                LittleEndian::read_i16(&vertex[0..2]) as f32 / POSITION_SCALE,
                LittleEndian::read_i16(&vertex[2..4]) as f32 / POSITION_SCALE,
                LittleEndian::read_i16(&vertex[4..6]) as f32 / POSITION_SCALE,
            ]);
            block.skip.push(vertex[7] & 0x80 != 0);
        }
        let count = block.positions.len();

        if let Some((form, data)) = self.uv {
            let uvs: Vec<[f32; 2]> = match form {
                UvForm::Narrow => data
                    .chunks_exact(4)
                    .map(|uv| {
                        [
                            LittleEndian::read_i16(&uv[0..2]) as f32 / UV_SCALE,
                            LittleEndian::read_i16(&uv[2..4]) as f32 / UV_SCALE,
                        ]
                    })
                    .collect(),
                UvForm::Wide => data
                    .chunks_exact(8)
                    .map(|uv| {
                        [
                            LittleEndian::read_i32(&uv[0..4]) as f32 / UV_SCALE,
                            LittleEndian::read_i32(&uv[4..8]) as f32 / UV_SCALE,
                        ]
                    })
                    .collect(),
            };
            check_count("uv", uvs.len(), count, offset);
            block.uvs = Some(uvs);
        }

        if let Some(data) = self.normal {
            let normals: Vec<[f32; 3]> = data
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]].map(|c| c as i8 as f32 / NORMAL_SCALE))
                .collect();
            check_count("normal", normals.len(), count, offset);
            block.normals = Some(normals);
        }

        if let Some(data) = self.color {
            let colors: Vec<[u8; 4]> = data
                .chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], c[3]])
                .collect();
            check_count("color", colors.len(), count, offset);
            block.has_transparency = colors.iter().any(|c| c[3] < OPAQUE_ALPHA);
            block.colors = Some(colors);
        }

        if let Some(table) = self.meta {
            block.joints = Some(expand_joint_runs(table, count)?);
        }

        if !self.material.is_empty() {
            block.material = Some(self.material);
        }

        tracing::debug!(
            "{offset:#08x} flush {count} vertices: uv {} norm {} rgba {} joints {}",
            block.uvs.is_some(),
            block.normals.is_some(),
            block.colors.is_some(),
            block.joints.is_some()
        );
        Ok(Some(block))
    }
}

fn fill<T>(slot: &mut Option<T>, value: T, duplicate: Error) -> Result<()> {
    if slot.is_some() {
        return Err(duplicate);
    }
    *slot = Some(value);
    Ok(())
}

fn check_count(attribute: &str, len: usize, vertices: usize, offset: usize) {
    if len != vertices {
        tracing::warn!("{offset:#08x} {len} {attribute} values for {vertices} vertices");
    }
}
