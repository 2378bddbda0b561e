//! Archive nodes.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use parking_lot::{Mutex, RwLock};

use crate::registry::Payload;

/// Dense node identity, assigned in archive order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Create an id from its raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Index into the node table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry of the resource tree.
///
/// A node either holds a payload (`size > 0`) or is a link: a zero-sized
/// alias whose name is looked up from the link's own position in the tree.
pub struct WadNode {
    pub(crate) id: NodeId,
    pub(crate) name: Box<[u8]>,
    pub(crate) flags: u16,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) start: usize,
    pub(crate) size: u32,
    pub(crate) format: Option<u32>,
    pub(crate) cache: DecodeCell,
}

impl WadNode {
    pub(crate) fn new(
        id: NodeId,
        name: &[u8],
        flags: u16,
        parent: Option<NodeId>,
        start: usize,
        size: u32,
        format: Option<u32>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            flags,
            parent,
            children: Vec::new(),
            start,
            size,
            format,
            cache: DecodeCell::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Raw name bytes (may be empty, not unique within a scope).
    #[inline]
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Name for display.
    #[inline]
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Record flags.
    #[inline]
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Enclosing node, `None` for roots.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in archive order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node aliases another node by name.
    #[inline]
    pub fn is_link(&self) -> bool {
        self.size == 0
    }

    /// Payload size in bytes.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Absolute payload range in the archive.
    #[inline]
    pub fn byte_range(&self) -> Range<usize> {
        self.start..self.start + self.size as usize
    }

    /// First four payload bytes, `None` for links.
    #[inline]
    pub fn format(&self) -> Option<u32> {
        self.format
    }

    /// Whether a decoded payload is cached.
    pub fn is_decoded(&self) -> bool {
        self.cache.get().is_some()
    }
}

impl fmt::Debug for WadNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WadNode")
            .field("id", &self.id)
            .field("name", &self.name_lossy())
            .field("parent", &self.parent)
            .field("children", &self.children.len())
            .field("range", &self.byte_range())
            .field("format", &self.format)
            .field("decoded", &self.is_decoded())
            .finish()
    }
}

/// Decode-once slot.
///
/// `init` is held across the decode, so concurrent requests for one node
/// wait for the single decode in flight. The value sits behind its own lock,
/// taken only to copy the `Arc` in or out, so [`get`](Self::get) does not
/// wait on a running decode. Failures are never stored.
#[derive(Default)]
pub(crate) struct DecodeCell {
    value: RwLock<Option<Payload>>,
    init: Mutex<()>,
}

impl DecodeCell {
    pub(crate) fn get(&self) -> Option<Payload> {
        self.value.read().clone()
    }

    pub(crate) fn get_or_try_init<E>(
        &self,
        init: impl FnOnce() -> Result<Payload, E>,
    ) -> Result<Payload, E> {
        if let Some(payload) = self.get() {
            return Ok(payload);
        }

        let _guard = self.init.lock();
        if let Some(payload) = self.get() {
            return Ok(payload);
        }
        let payload = init()?;
        *self.value.write() = Some(Payload::clone(&payload));
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_link_has_no_payload() {
        let link = WadNode::new(NodeId::new(3), b"TXR_x", 0, None, 0x40, 0, None);
        assert!(link.is_link());
        assert!(link.byte_range().is_empty());
        assert_eq!(link.format(), None);
        assert_eq!(link.id().to_string(), "#3");
    }

    #[test]
    fn test_cell_keeps_first_value() {
        let cell = DecodeCell::default();
        let first = cell
            .get_or_try_init::<()>(|| Ok(Arc::new(1u32) as Payload))
            .unwrap();
        let second = cell
            .get_or_try_init::<()>(|| Ok(Arc::new(2u32) as Payload))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cell_does_not_store_failure() {
        let cell = DecodeCell::default();
        assert!(cell.get_or_try_init(|| Err("boom")).is_err());
        assert!(cell.get().is_none());
        assert!(cell
            .get_or_try_init::<&str>(|| Ok(Arc::new(5u8) as Payload))
            .is_ok());
        assert!(cell.get().is_some());
    }

    #[test]
    fn test_cell_readable_during_init() {
        let cell = DecodeCell::default();
        let payload = cell
            .get_or_try_init::<()>(|| {
                assert!(cell.get().is_none());
                Ok(Arc::new(3u16) as Payload)
            })
            .unwrap();

        assert!(Arc::ptr_eq(&cell.get().unwrap(), &payload));
    }
}
