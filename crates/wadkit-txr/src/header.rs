//! Texture header structure.

use wadkit_common::trim_name;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Width of the name fields.
pub const NAME_SIZE: usize = 24;

/// Texture header as stored at the start of the payload.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct TextureHeader {
    /// Always [`TXR_MAGIC`](crate::TXR_MAGIC)
    pub magic: u32,
    /// Pixel data (indexed) node name
    pub gfx: [u8; NAME_SIZE],
    /// Palette node name
    pub pal: [u8; NAME_SIZE],
    /// Sub-texture name, empty for most textures
    pub sub: [u8; NAME_SIZE],
    /// LOD coefficient, never positive
    pub coeff: i32,
    pub multiplier: f32,
    /// 0 or 0x8000 (alpha)
    pub flags1: u16,
    /// 0x01 mask, 0x51 font, 0x5d alpha
    pub flags2: u16,
}

impl TextureHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn gfx_name(&self) -> &[u8] {
        trim_name(&self.gfx)
    }

    pub fn pal_name(&self) -> &[u8] {
        trim_name(&self.pal)
    }

    pub fn sub_name(&self) -> &[u8] {
        trim_name(&self.sub)
    }
}
