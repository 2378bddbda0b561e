//! VIF packet codes and the packet reader.
//!
//! Every packet starts with a 32-bit code laid out as
//! `imm:u16 | num:u8 | cmd:u8` (little-endian). Codes with `cmd >= 0x60`
//! are unpacks that carry attribute data; everything below is a control
//! command with a fixed payload length.

use std::fmt;

use wadkit_common::BinaryReader;

use crate::{Error, Result};

/// Packets start on this boundary.
pub const PACKET_ALIGNMENT: usize = 4;

/// First command byte that denotes an unpack.
pub const UNPACK_BASE: u8 = 0x60;

/// Unpack targets that carry the vertex metadata table.
pub const VERTEX_META_TARGETS: [u16; 3] = [0x000, 0x155, 0x2ab];

/// Element width by the low two command bits. Width 4 is packed 5551 color.
const WIDTHS: [u8; 4] = [32, 16, 8, 4];

/// Decoded unpack header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unpack {
    /// Raw command byte.
    pub cmd: u8,
    /// Components per element (1-4).
    pub components: u8,
    /// Bits per component (32, 16, 8 or 4).
    pub width: u8,
    /// Element count.
    pub num: u8,
    /// Components are sign-extended.
    pub signed: bool,
    /// Target is relative to the double-buffer base.
    pub address: bool,
    /// Destination address in vector-unit memory.
    pub target: u16,
}

impl Unpack {
    fn parse(cmd: u8, num: u8, imm: u16) -> Self {
        Self {
            cmd,
            components: ((cmd >> 2) & 0x3) + 1,
            width: WIDTHS[(cmd & 0x3) as usize],
            num,
            signed: imm & (1 << 14) == 0,
            address: imm & (1 << 15) != 0,
            target: imm & 0x3ff,
        }
    }

    /// Payload length in bytes.
    pub fn byte_len(&self) -> usize {
        self.components as usize * self.width as usize * self.num as usize / 8
    }

    /// Attribute role for this unpack format, if it is one the game emits.
    pub fn role(&self) -> Option<Role> {
        match (self.width, self.components, self.signed) {
            (32, 4, true) if VERTEX_META_TARGETS.contains(&self.target) => Some(Role::VertexMeta),
            (32, 4, true) => Some(Role::Material),
            (32, 2, true) => Some(Role::Uv(UvForm::Wide)),
            (16, 4, true) => Some(Role::Position),
            (16, 2, true) => Some(Role::Uv(UvForm::Narrow)),
            (8, 3, true) => Some(Role::Normal),
            (8, 4, false) => Some(Role::Color),
            _ => None,
        }
    }
}

/// UV element encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvForm {
    /// Two i16 per vertex.
    Narrow,
    /// Two i32 per vertex.
    Wide,
}

/// What an unpack's data means to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Position,
    Uv(UvForm),
    Normal,
    Color,
    /// Joint assignment table.
    VertexMeta,
    /// Material/reference rows.
    Material,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Position => "xyzw",
            Self::Uv(UvForm::Narrow) => "uv2_16",
            Self::Uv(UvForm::Wide) => "uv2_32",
            Self::Normal => "norm",
            Self::Color => "rgba",
            Self::VertexMeta => "vmta",
            Self::Material => "mref",
        })
    }
}

/// A decoded packet code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Nop,
    /// Write/cycle lengths for the following unpacks.
    StCycl { wl: u8, cl: u8 },
    Offset(u16),
    Base(u16),
    Itop(u16),
    /// Decompression mode: 0 normal, 1 offset, 2 difference.
    StMod(u8),
    MskPath3(bool),
    Mark(u16),
    FlushE,
    Flush,
    FlushA,
    /// Start the microprogram at an address.
    MsCal(u16),
    MsCalf(u16),
    /// Continue the microprogram.
    MsCnt,
    StMask,
    /// Row registers; 16 bytes follow.
    StRow,
    /// Column registers; 16 bytes follow.
    StCol,
    Unpack(Unpack),
}

impl Command {
    /// Decode a packet code. Unknown control codes yield an error.
    pub fn parse(code: [u8; 4], offset: usize) -> Result<Self> {
        let imm = u16::from_le_bytes([code[0], code[1]]);
        let num = code[2];
        let cmd = code[3];

        if cmd >= UNPACK_BASE {
            return Ok(Self::Unpack(Unpack::parse(cmd, num, imm)));
        }

        Ok(match cmd {
            0x00 => Self::Nop,
            0x01 => Self::StCycl {
                wl: code[1],
                cl: code[0],
            },
            0x02 => Self::Offset(imm & 0x3ff),
            0x03 => Self::Base(imm & 0x3ff),
            0x04 => Self::Itop(imm & 0x3ff),
            0x05 => Self::StMod(code[0] & 0x3),
            0x06 => Self::MskPath3(imm & (1 << 15) != 0),
            0x07 => Self::Mark(imm),
            0x10 => Self::FlushE,
            0x11 => Self::Flush,
            0x13 => Self::FlushA,
            0x14 => Self::MsCal(imm),
            0x15 => Self::MsCalf(imm),
            0x17 => Self::MsCnt,
            0x20 => Self::StMask,
            0x30 => Self::StRow,
            0x31 => Self::StCol,
            _ => {
                return Err(Error::UnknownCommand {
                    offset,
                    cmd,
                    num,
                    imm,
                })
            }
        })
    }

    /// Bytes following the code.
    pub fn payload_len(&self) -> usize {
        match self {
            Self::StMask => 4,
            Self::StRow | Self::StCol => 16,
            Self::Unpack(unpack) => unpack.byte_len(),
            _ => 0,
        }
    }

    /// Whether the command kicks the microprogram, consuming staged data.
    pub fn is_flush(&self) -> bool {
        matches!(self, Self::MsCal(_) | Self::MsCalf(_) | Self::MsCnt)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nop => write!(f, "nop"),
            Self::StCycl { wl, cl } => write!(f, "stcycl wl={wl:#04x} cl={cl:#04x}"),
            Self::Offset(v) => write!(f, "offset {v:#05x}"),
            Self::Base(v) => write!(f, "base {v:#05x}"),
            Self::Itop(v) => write!(f, "itop {v:#05x}"),
            Self::StMod(mode) => write!(f, "stmod mode={mode}"),
            Self::MskPath3(on) => write!(f, "mskpath3 {on}"),
            Self::Mark(v) => write!(f, "mark {v:#06x}"),
            Self::FlushE => write!(f, "flushe"),
            Self::Flush => write!(f, "flush"),
            Self::FlushA => write!(f, "flusha"),
            Self::MsCal(addr) => write!(f, "mscal {addr:#06x}"),
            Self::MsCalf(addr) => write!(f, "mscalf {addr:#06x}"),
            Self::MsCnt => write!(f, "mscnt"),
            Self::StMask => write!(f, "stmask"),
            Self::StRow => write!(f, "strow"),
            Self::StCol => write!(f, "stcol"),
            Self::Unpack(u) => write!(
                f,
                "unpack [{}] cmd={:#04x} elements={:#04x} components={} width={} target={:#05x} signed={} addr={} size={:#x}",
                u.role().map_or_else(|| "????".to_string(), |r| r.to_string()),
                u.cmd,
                u.num,
                u.components,
                u.width,
                u.target,
                u.signed,
                u.address,
                u.byte_len()
            ),
        }
    }
}

/// One packet of the stream.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    /// Absolute offset of the packet code.
    pub offset: usize,
    pub command: Command,
    /// Data following the code.
    pub payload: &'a [u8],
}

/// Iterator over the packets of a stream.
///
/// Stops after the first error.
#[derive(Debug, Clone)]
pub struct VifReader<'a> {
    reader: BinaryReader<'a>,
    base_offset: usize,
    failed: bool,
}

impl<'a> VifReader<'a> {
    /// Read packets from `data`, reporting offsets relative to `base_offset`.
    pub fn new(data: &'a [u8], base_offset: usize) -> Self {
        Self {
            reader: BinaryReader::new(data),
            base_offset,
            failed: false,
        }
    }

    fn read_packet(&mut self) -> Result<Packet<'a>> {
        let offset = self.base_offset + self.reader.position();
        let truncated = |needed: usize, available: usize| Error::Truncated {
            offset,
            needed,
            available,
        };

        let code = self
            .reader
            .read_array::<4>()
            .map_err(|_| truncated(4, self.reader.remaining()))?;
        let command = Command::parse(code, offset)?;

        let len = command.payload_len();
        let payload = self
            .reader
            .read_bytes(len)
            .map_err(|_| truncated(len, self.reader.remaining()))?;

        Ok(Packet {
            offset,
            command,
            payload,
        })
    }
}

impl<'a> Iterator for VifReader<'a> {
    type Item = Result<Packet<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.reader.align(PACKET_ALIGNMENT);
        if self.reader.is_empty() {
            return None;
        }

        let packet = self.read_packet();
        self.failed = packet.is_err();
        Some(packet)
    }
}
