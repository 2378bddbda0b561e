//! Texture headers from WAD archives.
//!
//! A texture payload (format tag [`TXR_MAGIC`]) is a fixed 0x58-byte header
//! naming the indexed pixel data and the palette it is drawn with. Both are
//! separate nodes, looked up by name from the texture's own position in the
//! archive.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wadkit_wad::{Registry, Wad};
//!
//! let mut registry = Registry::new();
//! wadkit_txr::register(&mut registry);
//!
//! let wad = Wad::open("R_PERM.WAD", Arc::new(registry))?;
//! let id = wad.lookup(b"TXR_SKY", None)?;
//! let texture = wad.get_as::<wadkit_txr::Texture>(id)?;
//! println!("{:?} uses palette {:?}", texture.gfx_name, texture.pal);
//! # Ok::<(), wadkit_wad::Error>(())
//! ```

mod error;
mod header;

pub use error::{Error, Result};
pub use header::{TextureHeader, NAME_SIZE};

use std::borrow::Cow;
use std::sync::Arc;

use wadkit_common::BinaryReader;
use wadkit_wad::{NodeId, Payload, Registry, Wad, WadNode};

/// Texture format tag and header magic.
pub const TXR_MAGIC: u32 = 0x0000_0007;

/// Known `flags2` values.
pub const KNOWN_FLAGS2: [u16; 5] = [0x01, 0x11, 0x41, 0x51, 0x5d];

/// A decoded texture header with its references resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub gfx_name: String,
    pub pal_name: String,
    pub sub_name: String,
    pub coeff: i32,
    pub multiplier: f32,
    pub flags1: u16,
    pub flags2: u16,
    /// Resolved pixel data node, when a name is set.
    pub gfx: Option<NodeId>,
    /// Resolved palette node, when a name is set.
    pub pal: Option<NodeId>,
}

impl Texture {
    /// Whether the texture carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.flags1 == 0x8000
    }
}

/// Parse and validate a texture header without resolving its references.
pub fn parse_header(reader: &mut BinaryReader<'_>) -> Result<TextureHeader> {
    // the magic stays part of the header struct
    reader.clone().expect_magic(TXR_MAGIC)?;

    let header: TextureHeader = reader.read_struct()?;
    let (coeff, flags1, flags2) = (header.coeff, header.flags1, header.flags2);

    if coeff > 0 {
        return Err(Error::Coefficient(coeff));
    }
    if flags1 != 0 && flags1 != 0x8000 {
        return Err(Error::Flags1(flags1));
    }
    if !KNOWN_FLAGS2.contains(&flags2) {
        return Err(Error::Flags2(flags2));
    }

    Ok(header)
}

/// Decode the texture stored in `node`.
pub fn decode(wad: &Wad, node: &WadNode, mut reader: BinaryReader<'_>) -> Result<Texture> {
    let header = parse_header(&mut reader)?;

    let resolve = |kind: &'static str, name: &[u8]| -> Result<Option<NodeId>> {
        if name.is_empty() {
            return Ok(None);
        }
        wad.find_from(node.id(), name)
            .map(Some)
            .map_err(|source| Error::Unresolved {
                kind,
                name: lossy(name).into_owned(),
                source,
            })
    };

    let gfx = resolve("gfx", header.gfx_name())?;
    let pal = resolve("pal", header.pal_name())?;

    tracing::debug!(
        "texture {} gfx {:?} pal {:?}",
        node.id(),
        gfx.map(|id| id.to_string()),
        pal.map(|id| id.to_string())
    );

    Ok(Texture {
        gfx_name: lossy(header.gfx_name()).into_owned(),
        pal_name: lossy(header.pal_name()).into_owned(),
        sub_name: lossy(header.sub_name()).into_owned(),
        coeff: header.coeff,
        multiplier: header.multiplier,
        flags1: header.flags1,
        flags2: header.flags2,
        gfx,
        pal,
    })
}

/// Register the texture decoder for [`TXR_MAGIC`].
pub fn register(registry: &mut Registry) -> &mut Registry {
    registry.register(TXR_MAGIC, |wad, node, reader| {
        Ok(Arc::new(decode(wad, node, reader)?) as Payload)
    })
}

fn lossy(name: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wadkit_wad::record::{RecordHeader, Tag, PAYLOAD_ALIGNMENT};
    use zerocopy::IntoBytes;

    fn header(gfx: &[u8], pal: &[u8], coeff: i32, flags1: u16, flags2: u16) -> Vec<u8> {
        let mut header = TextureHeader {
            magic: TXR_MAGIC,
            gfx: [0; NAME_SIZE],
            pal: [0; NAME_SIZE],
            sub: [0; NAME_SIZE],
            coeff,
            multiplier: 1.0,
            flags1,
            flags2,
        };
        header.gfx[..gfx.len()].copy_from_slice(gfx);
        header.pal[..pal.len()].copy_from_slice(pal);
        header.as_bytes().to_vec()
    }

    fn record(out: &mut Vec<u8>, tag: Tag, name: &[u8], payload: &[u8]) {
        out.extend_from_slice(RecordHeader::new(tag.raw(), 0, payload.len() as u32, name).as_bytes());
        out.extend_from_slice(payload);
        while out.len() % PAYLOAD_ALIGNMENT != 0 {
            out.push(0);
        }
    }

    fn archive(texture: &[u8]) -> Wad {
        let mut data = Vec::new();
        record(&mut data, Tag::FileData, b"GFX_SKY", &[0x0c, 0, 0, 0]);
        record(&mut data, Tag::FileData, b"PAL_SKY", &[0x0c, 0, 0, 0]);
        record(&mut data, Tag::FileData, b"TXR_SKY", texture);

        let mut registry = Registry::new();
        register(&mut registry);
        Wad::from_bytes("TEST.WAD", data, Arc::new(registry)).unwrap()
    }

    #[test]
    fn test_decode_resolves_references() {
        let wad = archive(&header(b"GFX_SKY", b"PAL_SKY", -3, 0x8000, 0x5d));
        let id = wad.lookup(b"TXR_SKY", None).unwrap();

        let texture = wad.get_as::<Texture>(id).unwrap();
        assert_eq!(texture.gfx_name, "GFX_SKY");
        assert_eq!(texture.gfx, Some(NodeId::new(0)));
        assert_eq!(texture.pal, Some(NodeId::new(1)));
        assert_eq!(texture.coeff, -3);
        assert!(texture.has_alpha());
    }

    #[test]
    fn test_empty_names_not_resolved() {
        let wad = archive(&header(b"", b"", 0, 0, 0x01));
        let texture = wad.get_as::<Texture>(NodeId::new(2)).unwrap();
        assert_eq!(texture.gfx, None);
        assert_eq!(texture.pal, None);
    }

    #[test]
    fn test_unresolved_palette() {
        let wad = archive(&header(b"GFX_SKY", b"PAL_SEA", 0, 0, 0x01));

        let err = wad.get(NodeId::new(2)).unwrap_err();
        let wadkit_wad::Error::Decode { source, .. } = err else {
            panic!("expected a decode error");
        };
        assert!(matches!(
            source.downcast_ref::<Error>(),
            Some(Error::Unresolved { kind: "pal", .. })
        ));
    }

    #[test]
    fn test_validation() {
        let parse = |bytes: Vec<u8>| parse_header(&mut BinaryReader::new(&bytes)).map(|_| ());

        assert!(parse(header(b"", b"", 0, 0, 0x11)).is_ok());
        assert!(matches!(
            parse(header(b"", b"", 1, 0, 0x01)),
            Err(Error::Coefficient(1))
        ));
        assert!(matches!(
            parse(header(b"", b"", 0, 0x4000, 0x01)),
            Err(Error::Flags1(0x4000))
        ));
        assert!(matches!(
            parse(header(b"", b"", 0, 0, 0x02)),
            Err(Error::Flags2(0x02))
        ));

        let mut bad_magic = header(b"", b"", 0, 0, 0x01);
        bad_magic[0] = 8;
        assert!(matches!(
            parse(bad_magic),
            Err(Error::Common(wadkit_common::Error::InvalidMagic {
                expected: 7,
                actual: 8
            }))
        ));
    }

    #[test]
    fn test_short_payload() {
        let bytes = &header(b"", b"", 0, 0, 0x01)[..0x40];
        assert!(matches!(
            parse_header(&mut BinaryReader::new(bytes)),
            Err(Error::Common(_))
        ));
    }

    #[test]
    fn test_magic_checked_before_reading() {
        let mut bytes = header(b"", b"", 0, 0, 0x01);
        bytes[0] = 0x0f;
        let mut reader = BinaryReader::new(&bytes);

        assert!(matches!(
            parse_header(&mut reader),
            Err(Error::Common(wadkit_common::Error::InvalidMagic { actual: 0x0f, .. }))
        ));
        assert_eq!(reader.position(), 0);
    }
}
