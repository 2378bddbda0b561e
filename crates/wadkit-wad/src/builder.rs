//! Tree construction from the record stream.

use wadkit_common::BinaryReader;

use crate::record::{padded_size, RecordHeader, Tag};
use crate::{Error, NodeId, Result, WadNode};

/// Node arena under construction.
#[derive(Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<WadNode>,
    roots: Vec<NodeId>,
    current: Option<NodeId>,
    group_pending: bool,
}

impl TreeBuilder {
    /// Append a node to the current scope.
    fn push(
        &mut self,
        name: &[u8],
        flags: u16,
        start: usize,
        size: u32,
        format: Option<u32>,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);

        let siblings = match self.current {
            Some(parent) => &self.nodes[parent.index()].children,
            None => &self.roots,
        };
        if let Some(shadowed) = siblings
            .iter()
            .rev()
            .find(|s| &*self.nodes[s.index()].name == name)
        {
            tracing::debug!(
                "node {id} shadows sibling {shadowed} named {:?}",
                String::from_utf8_lossy(name)
            );
        }

        self.nodes
            .push(WadNode::new(id, name, flags, self.current, start, size, format));
        match self.current {
            Some(parent) => self.nodes[parent.index()].children.push(id),
            None => self.roots.push(id),
        }

        if self.group_pending {
            self.group_pending = false;
            self.current = Some(id);
        }
        id
    }

    fn group_start(&mut self) {
        self.group_pending = true;
    }

    fn group_end(&mut self, offset: usize) -> Result<()> {
        self.group_pending = false;
        let current = self
            .current
            .ok_or(Error::UnbalancedGroupEnd { offset })?;
        self.current = self.nodes[current.index()].parent;
        Ok(())
    }

    fn finish(self) -> (Vec<WadNode>, Vec<NodeId>) {
        (self.nodes, self.roots)
    }
}

/// Scan the record stream and build the node tree.
///
/// Stops cleanly when the next record would start at or past the end of
/// `data`. Any malformed record rejects the whole archive.
pub(crate) fn build_tree(data: &[u8]) -> Result<(Vec<WadNode>, Vec<NodeId>)> {
    let mut builder = TreeBuilder::default();
    let mut offset = 0usize;

    while offset < data.len() {
        let available = data.len() - offset;
        if available < RecordHeader::SIZE {
            return Err(Error::TruncatedRecord { offset, available });
        }

        let header: RecordHeader = BinaryReader::bounded(data, offset, RecordHeader::SIZE)?
            .read_struct()?;
        let payload_start = offset + RecordHeader::SIZE;
        let mut size = header.size;

        match Tag::try_from(header.tag) {
            Ok(Tag::FileData) => {
                let format = if size == 0 {
                    None
                } else {
                    Some(read_format(data, payload_start, size)?)
                };
                builder.push(header.name(), header.flags, payload_start, size, format);
            }
            Ok(Tag::GroupStart) => builder.group_start(),
            Ok(Tag::GroupEnd) => builder.group_end(offset)?,
            Ok(Tag::EntityCount) => size = 0,
            Ok(Tag::Reserved(tag)) => {
                tracing::trace!("skipping reserved record {tag:#06x} at {offset:#x}");
            }
            Err(tag) => {
                return Err(Error::UnknownTag {
                    tag,
                    offset,
                    size,
                    name: String::from_utf8_lossy(header.name()).into_owned(),
                })
            }
        }

        let payload_end = payload_start + size as usize;
        if payload_end > data.len() {
            tracing::debug!(
                "record {:#06x} at {offset:#x} claims {size} bytes, only {} remain; stopping",
                { header.tag },
                data.len() - payload_start
            );
            break;
        }

        offset = payload_start + padded_size(size);
    }

    Ok(builder.finish())
}

/// Read the format tag of a payload.
///
/// Payloads shorter than four bytes are zero-extended.
fn read_format(data: &[u8], start: usize, size: u32) -> Result<u32> {
    let payload = BinaryReader::bounded(data, start, size as usize)
        .map_err(|_| Error::TruncatedPayload {
            offset: start,
            size,
            len: data.len(),
        })?
        .as_bytes();

    let mut bytes = [0u8; 4];
    let len = payload.len().min(4);
    bytes[..len].copy_from_slice(&payload[..len]);
    Ok(u32::from_le_bytes(bytes))
}

#[cfg(test)]
pub(crate) mod tests {
    use zerocopy::IntoBytes;

    use super::*;
    use crate::record::PAYLOAD_ALIGNMENT;

    /// Append one record with its padded payload.
    pub(crate) fn record(out: &mut Vec<u8>, tag: u16, name: &[u8], payload: &[u8]) {
        out.extend_from_slice(RecordHeader::new(tag, 0, payload.len() as u32, name).as_bytes());
        out.extend_from_slice(payload);
        while out.len() % PAYLOAD_ALIGNMENT != 0 {
            out.push(0);
        }
    }

    pub(crate) fn file(out: &mut Vec<u8>, name: &str, payload: &[u8]) {
        record(out, Tag::FILE_DATA, name.as_bytes(), payload);
    }

    pub(crate) fn link(out: &mut Vec<u8>, name: &str) {
        record(out, Tag::FILE_DATA, name.as_bytes(), &[]);
    }

    pub(crate) fn group_start(out: &mut Vec<u8>) {
        record(out, Tag::GROUP_START, b"", &[]);
    }

    pub(crate) fn group_end(out: &mut Vec<u8>) {
        record(out, Tag::GROUP_END, b"", &[]);
    }

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::new).collect()
    }

    #[test]
    fn test_empty_archive() {
        let (nodes, roots) = build_tree(&[]).unwrap();
        assert!(nodes.is_empty());
        assert!(roots.is_empty());
    }

    #[test]
    fn test_group_nesting() {
        let mut data = Vec::new();
        file(&mut data, "first", b"\x07\0\0\0");
        group_start(&mut data);
        file(&mut data, "group", b"\x01\0\0\0");
        file(&mut data, "child_a", b"\x02\0\0\0");
        group_start(&mut data);
        file(&mut data, "inner", b"\x03\0\0\0");
        file(&mut data, "grandchild", b"\x04\0\0\0");
        group_end(&mut data);
        link(&mut data, "child_b");
        group_end(&mut data);
        file(&mut data, "last", b"\x05\0\0\0");

        let (nodes, roots) = build_tree(&data).unwrap();

        assert_eq!(nodes.len(), 7);
        assert_eq!(roots, ids(&[0, 1, 6]));
        assert_eq!(nodes[1].children(), ids(&[2, 3, 5]).as_slice());
        assert_eq!(nodes[3].children(), ids(&[4]).as_slice());
        assert_eq!(nodes[4].parent(), Some(NodeId::new(3)));
        assert_eq!(nodes[5].parent(), Some(NodeId::new(1)));
        assert_eq!(nodes[6].parent(), None);
        assert!(nodes[5].is_link());
        assert_eq!(nodes[5].format(), None);
        assert_eq!(nodes[2].format(), Some(2));
    }

    #[test]
    fn test_payload_range_and_alignment() {
        let mut data = Vec::new();
        file(&mut data, "odd", &[0x11, 0, 0, 0, 0xaa]);
        file(&mut data, "next", &[0x22, 0, 0, 0]);

        let (nodes, _) = build_tree(&data).unwrap();

        assert_eq!(nodes[0].byte_range(), 32..37);
        // 5 bytes padded to 16, then the next header
        assert_eq!(nodes[1].byte_range(), 80..84);
        assert_eq!(nodes[1].format(), Some(0x22));
    }

    #[test]
    fn test_short_payload_format_zero_extended() {
        let mut data = Vec::new();
        file(&mut data, "tiny", &[0x0f, 0x01]);

        let (nodes, _) = build_tree(&data).unwrap();
        assert_eq!(nodes[0].format(), Some(0x010f));
    }

    #[test]
    fn test_entity_count_has_no_payload() {
        let mut data = Vec::new();
        data.extend_from_slice(RecordHeader::new(Tag::ENTITY_COUNT, 0, 500, b"").as_bytes());
        file(&mut data, "after", b"\x07\0\0\0");

        let (nodes, roots) = build_tree(&data).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(roots, ids(&[0]));
        assert_eq!(nodes[0].byte_range().start, 64);
    }

    #[test]
    fn test_reserved_tag_skips_payload() {
        let mut data = Vec::new();
        record(&mut data, 0x01f4, b"RSRCS", &[0xff; 20]);
        file(&mut data, "after", b"\x07\0\0\0");

        let (nodes, _) = build_tree(&data).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name(), b"after");
    }

    #[test]
    fn test_reserved_record_past_end_stops_scan() {
        let mut data = Vec::new();
        file(&mut data, "before", b"\x07\0\0\0");
        data.extend_from_slice(RecordHeader::new(0x006e, 0, 0x1000, b"MEMCARD").as_bytes());
        data.extend_from_slice(&[0xff; 16]);

        let (nodes, roots) = build_tree(&data).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(roots, ids(&[0]));
        assert_eq!(nodes[0].name(), b"before");
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut data = Vec::new();
        file(&mut data, "ok", b"\x07\0\0\0");
        record(&mut data, 0x0bad, b"what", &[]);

        match build_tree(&data) {
            Err(Error::UnknownTag { tag, offset, .. }) => {
                assert_eq!(tag, 0x0bad);
                assert_eq!(offset, 48);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_group_end() {
        let mut data = Vec::new();
        group_end(&mut data);

        assert!(matches!(
            build_tree(&data),
            Err(Error::UnbalancedGroupEnd { offset: 0 })
        ));
    }

    #[test]
    fn test_truncated_record() {
        let mut data = Vec::new();
        file(&mut data, "ok", b"\x07\0\0\0");
        data.extend_from_slice(&[0x1e, 0, 0, 0]);

        assert!(matches!(
            build_tree(&data),
            Err(Error::TruncatedRecord {
                offset: 48,
                available: 4
            })
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let mut data = Vec::new();
        data.extend_from_slice(RecordHeader::new(Tag::FILE_DATA, 0, 64, b"big").as_bytes());
        data.extend_from_slice(&[7, 0, 0, 0]);

        assert!(matches!(
            build_tree(&data),
            Err(Error::TruncatedPayload { size: 64, .. })
        ));
    }

    #[test]
    fn test_unpadded_final_payload() {
        let mut data = Vec::new();
        data.extend_from_slice(RecordHeader::new(Tag::FILE_DATA, 3, 5, b"end").as_bytes());
        data.extend_from_slice(&[7, 0, 0, 0, 1]);

        let (nodes, _) = build_tree(&data).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].flags(), 3);
    }
}
