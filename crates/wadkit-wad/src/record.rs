//! Archive record structures.
//!
//! A WAD archive is a flat run of 32-byte record headers. A header may be
//! followed by a payload of `size` bytes, zero-padded to a 16-byte boundary.

use wadkit_common::trim_name;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Width of the NUL-padded name field in a record header.
pub const NAME_SIZE: usize = 24;

/// Payloads start and end on this boundary.
pub const PAYLOAD_ALIGNMENT: usize = 16;

/// Record header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct RecordHeader {
    /// Record tag, see [`Tag`]
    pub tag: u16,
    /// Tag-specific flags
    pub flags: u16,
    /// Payload size (a count for entity-count records)
    pub size: u32,
    /// NUL-padded name
    pub name: [u8; NAME_SIZE],
}

impl RecordHeader {
    /// Size of a record header in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Build a header, truncating `name` to the name field.
    pub fn new(tag: u16, flags: u16, size: u32, name: &[u8]) -> Self {
        let mut field = [0u8; NAME_SIZE];
        let len = name.len().min(NAME_SIZE);
        field[..len].copy_from_slice(&name[..len]);
        Self {
            tag,
            flags,
            size,
            name: field,
        }
    }

    /// The name without NUL padding.
    #[inline]
    pub fn name(&self) -> &[u8] {
        trim_name(&self.name)
    }
}

/// Distance from a payload start to the next record header.
#[inline]
pub fn padded_size(size: u32) -> usize {
    (size as usize + PAYLOAD_ALIGNMENT - 1) & !(PAYLOAD_ALIGNMENT - 1)
}

/// Record tags understood by the tree builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Payload record; creates a node.
    FileData,
    /// Next node created opens a nested scope.
    GroupStart,
    /// Closes the innermost scope.
    GroupEnd,
    /// Entity count metadata; `size` holds a count, not a payload length.
    EntityCount,
    /// Known tag with no effect on the tree.
    Reserved(u16),
}

impl Tag {
    pub const FILE_DATA: u16 = 0x001e;
    pub const GROUP_START: u16 = 0x0028;
    pub const GROUP_END: u16 = 0x0032;
    pub const ENTITY_COUNT: u16 = 0x0018;

    /// Tags that are consumed without touching the tree.
    pub const RESERVED: [u16; 9] = [
        0x006e, // memory card data
        0x006f, // memory card icon
        0x0070, // deformer shape
        0x0071, // cloth tweak
        0x0072, // combat file tweak
        0x01f4, // resources
        0x029a, // file data start
        0x0378, // file header start
        0x03e7, // file header pop heap
    ];

    /// Raw tag value.
    pub fn raw(self) -> u16 {
        match self {
            Self::FileData => Self::FILE_DATA,
            Self::GroupStart => Self::GROUP_START,
            Self::GroupEnd => Self::GROUP_END,
            Self::EntityCount => Self::ENTITY_COUNT,
            Self::Reserved(tag) => tag,
        }
    }
}

impl TryFrom<u16> for Tag {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            Self::FILE_DATA => Ok(Self::FileData),
            Self::GROUP_START => Ok(Self::GroupStart),
            Self::GROUP_END => Ok(Self::GroupEnd),
            Self::ENTITY_COUNT => Ok(Self::EntityCount),
            other if Self::RESERVED.contains(&other) => Ok(Self::Reserved(other)),
            other => Err(other),
        }
    }
}
