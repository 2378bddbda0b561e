//! Flushed vertex blocks.

/// GS positions are 12.4 fixed point.
pub const POSITION_SCALE: f32 = 16.0;

/// UVs are fixed point with 12 fraction bits.
pub const UV_SCALE: f32 = 4096.0;

/// Normals are signed bytes in hundredths.
pub const NORMAL_SCALE: f32 = 100.0;

/// Colors with alpha below this blend with what is behind them.
pub const OPAQUE_ALPHA: u8 = 0x80;

/// One unit of geometry produced by a flush.
///
/// Positions are always present. Every other attribute is optional and
/// independent per block.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VertexBlock {
    pub(crate) positions: Vec<[f32; 3]>,
    pub(crate) skip: Vec<bool>,
    pub(crate) uvs: Option<Vec<[f32; 2]>>,
    pub(crate) normals: Option<Vec<[f32; 3]>>,
    pub(crate) colors: Option<Vec<[u8; 4]>>,
    pub(crate) joints: Option<Vec<u16>>,
    pub(crate) material: Option<Vec<[u32; 4]>>,
    pub(crate) has_transparency: bool,
    pub(crate) offset: usize,
}

impl VertexBlock {
    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Per-vertex skip flag (bit 15 of w); skipped vertices draw no triangle.
    #[inline]
    pub fn skip(&self) -> &[bool] {
        &self.skip
    }

    #[inline]
    pub fn uvs(&self) -> Option<&[[f32; 2]]> {
        self.uvs.as_deref()
    }

    #[inline]
    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    /// RGBA, alpha 0x80 is fully opaque.
    #[inline]
    pub fn colors(&self) -> Option<&[[u8; 4]]> {
        self.colors.as_deref()
    }

    /// Joint index per vertex.
    #[inline]
    pub fn joints(&self) -> Option<&[u16]> {
        self.joints.as_deref()
    }

    /// Material/reference rows staged with this block.
    #[inline]
    pub fn material(&self) -> Option<&[[u32; 4]]> {
        self.material.as_deref()
    }

    /// Whether any vertex color has alpha below [`OPAQUE_ALPHA`].
    #[inline]
    pub fn has_transparency(&self) -> bool {
        self.has_transparency
    }

    /// Stream offset of the packet that flushed this block.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}
