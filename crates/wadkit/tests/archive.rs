//! Archive to registry to decoder, end to end.

use std::sync::Arc;

use wadkit::prelude::*;
use wadkit::wad::record::{RecordHeader, Tag, PAYLOAD_ALIGNMENT};
use wadkit::MESH_MAGIC;
use zerocopy::IntoBytes;

#[derive(Default)]
struct Writer(Vec<u8>);

impl Writer {
    fn record(&mut self, tag: Tag, name: &[u8], payload: &[u8]) -> &mut Self {
        let header = RecordHeader::new(tag.raw(), 0, payload.len() as u32, name);
        self.0.extend_from_slice(header.as_bytes());
        self.0.extend_from_slice(payload);
        while self.0.len() % PAYLOAD_ALIGNMENT != 0 {
            self.0.push(0);
        }
        self
    }

    fn file(&mut self, name: &[u8], payload: &[u8]) -> &mut Self {
        self.record(Tag::FileData, name, payload)
    }

    fn link(&mut self, name: &[u8]) -> &mut Self {
        self.record(Tag::FileData, name, &[])
    }

    /// Open a group; the next node becomes its owner.
    fn group(&mut self) -> &mut Self {
        self.record(Tag::GroupStart, b"", &[])
    }

    fn end(&mut self) -> &mut Self {
        self.record(Tag::GroupEnd, b"", &[])
    }

    fn open(&self) -> Wad {
        Wad::from_bytes("TEST.WAD", self.0.clone(), Arc::new(wadkit::default_registry())).unwrap()
    }
}

/// Mesh payload: one position unpack and a microprogram call.
fn mesh(vertices: &[[i16; 4]]) -> Vec<u8> {
    let mut data = MESH_MAGIC.to_le_bytes().to_vec();
    data.extend_from_slice(&[0x01, 0x00, vertices.len() as u8, 0x6d]);
    for v in vertices {
        for c in v {
            data.extend_from_slice(&c.to_le_bytes());
        }
    }
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x14]);
    data
}

#[test]
fn test_mesh_through_link() {
    let wad = Writer::default()
        .file(b"MESH_HERO", &mesh(&[[16, 0, 0, 0], [0, 32, 0, 0]]))
        .group()
        .file(b"LEVEL", &[0; 4])
        .link(b"MESH_HERO")
        .end()
        .open();

    let link = wad.lookup(b"MESH_HERO", Some(NodeId::new(1))).unwrap();
    assert_eq!(link, NodeId::new(2));
    assert_eq!(wad.resolve(link).unwrap(), NodeId::new(0));

    let mesh = wad.get_as::<MeshStream>(link).unwrap();
    assert_eq!(mesh.blocks.len(), 1);
    assert_eq!(mesh.vertex_count(), 2);
    assert_eq!(mesh.blocks[0].positions(), &[[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);

    let direct = wad.get_as::<MeshStream>(NodeId::new(0)).unwrap();
    assert!(Arc::ptr_eq(&mesh, &direct));
    assert!(wad.node(NodeId::new(0)).unwrap().is_decoded());
}

#[test]
fn test_block_offsets_are_archive_offsets() {
    let wad = Writer::default()
        .file(b"MESH", &mesh(&[[0, 0, 0, 0]]))
        .open();

    let mesh = wad.get_as::<MeshStream>(NodeId::new(0)).unwrap();
    // record header, magic, unpack code and one vertex
    assert_eq!(mesh.blocks[0].offset(), 32 + 4 + 4 + 8);
}

#[test]
fn test_mesh_decode_error() {
    let mut payload = mesh(&[[0, 0, 0, 0]]);
    payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x4a]);

    let wad = Writer::default().file(b"MESH", &payload).open();

    let err = wad.get(NodeId::new(0)).unwrap_err();
    let wadkit::wad::Error::Decode { source, .. } = err else {
        panic!("expected a decode error");
    };
    assert!(matches!(
        source.downcast_ref::<wadkit::vif::Error>(),
        Some(wadkit::vif::Error::UnknownCommand { cmd: 0x4a, .. })
    ));
    assert!(!wad.node(NodeId::new(0)).unwrap().is_decoded());
}

#[test]
fn test_texture_sees_only_earlier_names() {
    let mut texture = vec![0u8; 0x58];
    texture[0] = 7;
    texture[4..11].copy_from_slice(b"GFX_SKY");
    texture[28..35].copy_from_slice(b"PAL_SKY");
    texture[86] = 0x01;

    let wad = Writer::default()
        .file(b"GFX_SKY", &[0; 4])
        .group()
        .file(b"SKY", &[0; 4])
        .file(b"TXR_SKY", &texture)
        .file(b"PAL_SKY", &[0; 4])
        .end()
        .open();

    // the palette is declared after the texture, so it is not visible
    let txr = wad.lookup(b"TXR_SKY", Some(NodeId::new(1))).unwrap();
    assert!(wad.get_as::<Texture>(txr).is_err());

    let wad = Writer::default()
        .file(b"GFX_SKY", &[0; 4])
        .group()
        .file(b"SKY", &[0; 4])
        .file(b"PAL_SKY", &[0; 4])
        .file(b"TXR_SKY", &texture)
        .end()
        .open();

    let texture = wad.get_as::<Texture>(NodeId::new(3)).unwrap();
    assert_eq!(texture.gfx, Some(NodeId::new(0)));
    assert_eq!(texture.pal, Some(NodeId::new(2)));
}

#[test]
fn test_unregistered_format() {
    let wad = Writer::default().file(b"RAW", &[0x99, 0, 0, 0]).open();

    assert!(matches!(
        wad.get(NodeId::new(0)),
        Err(wadkit::wad::Error::NoDecoder { format: 0x99, .. })
    ));
    assert!(wad.decode_all().is_empty());
}
