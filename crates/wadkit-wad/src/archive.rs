//! WAD archive: node tree, scoped lookup, link resolution and decode dispatch.

use std::any::Any;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use rustc_hash::FxHashSet;
use wadkit_common::BinaryReader;

use crate::builder::build_tree;
use crate::registry::{Payload, Registry};
use crate::{Error, NodeId, Result, WadNode};

/// Backing bytes of an archive.
enum Source {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Source {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Owned(bytes) => bytes,
        }
    }
}

/// A parsed WAD archive.
///
/// The node tree is immutable once construction succeeds. Decoded payloads
/// are cached per node, so a resource is decoded at most once for the
/// lifetime of the archive; failed decodes are not cached.
pub struct Wad {
    name: String,
    source: Source,
    nodes: Vec<WadNode>,
    roots: Vec<NodeId>,
    registry: Arc<Registry>,
}

impl Wad {
    /// Memory-map and parse an archive file.
    pub fn open<P: AsRef<Path>>(path: P, registry: Arc<Registry>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::from_source(name, Source::Mapped(mmap), registry)
    }

    /// Parse an archive held in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        data: Vec<u8>,
        registry: Arc<Registry>,
    ) -> Result<Self> {
        Self::from_source(name.into(), Source::Owned(data), registry)
    }

    fn from_source(name: String, source: Source, registry: Arc<Registry>) -> Result<Self> {
        let (nodes, roots) = build_tree(&source)?;
        tracing::debug!(
            "parsed {name}: {} nodes, {} roots, {} bytes",
            nodes.len(),
            roots.len(),
            source.len()
        );

        Ok(Self {
            name,
            source,
            nodes,
            roots,
            registry,
        })
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoders this archive dispatches to.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Raw archive bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.source
    }

    /// Get the number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in id order.
    #[inline]
    pub fn nodes(&self) -> &[WadNode] {
        &self.nodes
    }

    /// Top-level nodes in archive order.
    #[inline]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Get node by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&WadNode> {
        self.nodes.get(id.index())
    }

    fn try_node(&self, id: NodeId) -> Result<&WadNode> {
        self.node(id).ok_or(Error::NodeOutOfRange(id))
    }

    /// Members of a scope; `None` is the root scope.
    pub fn scope(&self, scope: Option<NodeId>) -> Result<&[NodeId]> {
        match scope {
            Some(id) => Ok(self.try_node(id)?.children()),
            None => Ok(&self.roots),
        }
    }

    /// Scoped name lookup.
    ///
    /// Searches `scope` for the last node named `name` with an id below
    /// `cutoff`. On a miss the search moves to the enclosing scope, with the
    /// scope node's own id as the new cutoff, so an outer name is seen as it
    /// was when the inner scope was opened.
    pub fn find(&self, name: &[u8], scope: Option<NodeId>, cutoff: NodeId) -> Result<NodeId> {
        let mut scope = scope;
        let mut cutoff = cutoff;

        loop {
            let found = self
                .scope(scope)?
                .iter()
                .copied()
                .take_while(|&id| id < cutoff)
                .filter(|&id| self.nodes[id.index()].name() == name)
                .last();
            if let Some(id) = found {
                return Ok(id);
            }

            match scope {
                Some(id) => {
                    cutoff = id;
                    scope = self.nodes[id.index()].parent();
                }
                None => {
                    return Err(Error::NotFound {
                        name: String::from_utf8_lossy(name).into_owned(),
                        scope: "root".to_string(),
                    })
                }
            }
        }
    }

    /// Look up a name with everything in `scope` visible.
    pub fn lookup(&self, name: &[u8], scope: Option<NodeId>) -> Result<NodeId> {
        self.find(name, scope, NodeId::new(self.nodes.len() as u32))
            .map_err(|e| self.scoped_not_found(e, scope))
    }

    /// Look up a name as seen from `node`'s position in the tree.
    pub fn find_from(&self, node: NodeId, name: &[u8]) -> Result<NodeId> {
        let origin = self.try_node(node)?;
        self.find(name, origin.parent(), origin.id())
            .map_err(|e| self.scoped_not_found(e, origin.parent()))
    }

    fn scoped_not_found(&self, err: Error, scope: Option<NodeId>) -> Error {
        match (err, scope) {
            (Error::NotFound { name, .. }, Some(id)) => Error::NotFound {
                name,
                scope: format!("{id} ({})", self.nodes[id.index()].name_lossy()),
            },
            (err, _) => err,
        }
    }

    /// Nodes visited while resolving `id`, in order.
    ///
    /// Empty when `id` is not a link; otherwise the last element is the
    /// resolved payload node.
    pub fn link_chain(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.follow_links(id, |link| self.find_from(link.id(), link.name()))
    }

    /// Follow links from `id` until a payload node is reached.
    pub fn resolve(&self, id: NodeId) -> Result<NodeId> {
        Ok(self.link_chain(id)?.last().copied().unwrap_or(id))
    }

    fn follow_links<F>(&self, id: NodeId, mut step: F) -> Result<Vec<NodeId>>
    where
        F: FnMut(&WadNode) -> Result<NodeId>,
    {
        let start = self.try_node(id)?;
        let mut chain = Vec::new();
        let mut visited = FxHashSet::default();
        visited.insert(id);

        let mut node = start;
        while node.is_link() {
            let next = step(node)?;
            if !visited.insert(next) {
                return Err(Error::CyclicLink {
                    id,
                    name: start.name_lossy().into_owned(),
                });
            }
            chain.push(next);
            node = self.try_node(next)?;
        }
        Ok(chain)
    }

    /// Reader bounded to one node's payload.
    pub fn reader(&self, id: NodeId) -> Result<BinaryReader<'_>> {
        let node = self.try_node(id)?;
        Ok(BinaryReader::bounded(
            &self.source,
            node.start,
            node.size as usize,
        )?)
    }

    /// One node's payload bytes.
    pub fn data(&self, id: NodeId) -> Result<&[u8]> {
        Ok(self.reader(id)?.as_bytes())
    }

    /// Decoded payload of a node, following links.
    ///
    /// The first successful decode is cached; later calls return the same
    /// instance. A failed decode leaves the cache empty, so the next call
    /// tries again.
    pub fn get(&self, id: NodeId) -> Result<Payload> {
        let target = self.resolve(id)?;
        let node = self.try_node(target)?;
        node.cache.get_or_try_init(|| self.decode(node))
    }

    /// Decoded payload downcast to `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, id: NodeId) -> Result<Arc<T>> {
        self.get(id)?
            .into_any()
            .downcast::<T>()
            .map_err(|_| Error::UnexpectedType {
                id,
                expected: std::any::type_name::<T>(),
            })
    }

    fn decode(&self, node: &WadNode) -> Result<Payload> {
        let format = node.format().unwrap_or_default();
        let decoder = self
            .registry
            .get(format)
            .ok_or_else(|| Error::NoDecoder {
                id: node.id(),
                name: node.name_lossy().into_owned(),
                format,
            })?;

        let reader = self.reader(node.id())?;
        tracing::debug!(
            "decoding {} {} ({:?}) format {format:#010x}, {} bytes",
            self.name,
            node.id(),
            node.name_lossy(),
            node.size()
        );

        decoder(self, node, reader).map_err(|source| Error::Decode {
            id: node.id(),
            name: node.name_lossy().into_owned(),
            source,
        })
    }

    /// Payload nodes with a registered decoder.
    pub fn decodable(&self) -> impl Iterator<Item = &WadNode> + '_ {
        self.nodes.iter().filter(|n| {
            n.format()
                .map_or(false, |format| self.registry.contains(format))
        })
    }

    /// Decode every payload node that has a registered decoder.
    pub fn decode_all(&self) -> Vec<(NodeId, Result<Payload>)> {
        self.decodable().map(|n| (n.id(), self.get(n.id()))).collect()
    }

    /// Parallel [`decode_all`](Self::decode_all).
    #[cfg(feature = "parallel")]
    pub fn decode_all_parallel(&self) -> Vec<(NodeId, Result<Payload>)> {
        use rayon::prelude::*;

        let ids: Vec<NodeId> = self.decodable().map(|n| n.id()).collect();
        ids.par_iter().map(|&id| (id, self.get(id))).collect()
    }

    /// Depth-first traversal in archive order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            wad: self,
            stack: self.roots.iter().rev().map(|&id| (0, id)).collect(),
        }
    }
}

/// Iterator returned by [`Wad::walk`], yielding `(depth, node)`.
pub struct Walk<'a> {
    wad: &'a Wad,
    stack: Vec<(usize, NodeId)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a WadNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        let node = &self.wad.nodes[id.index()];
        self.stack
            .extend(node.children().iter().rev().map(|&child| (depth + 1, child)));
        Some((depth, node))
    }
}

impl std::fmt::Debug for Wad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wad")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots.len())
            .field("registry", &self.registry)
            .finish()
    }
}
