//! Decoder registry.
//!
//! Format decoders are keyed by the 32-bit format tag stored in the first four
//! bytes of a node's payload. The registry is filled once at startup and then
//! shared read-only by every archive opened with it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use wadkit_common::BinaryReader;

use crate::error::BoxError;
use crate::{Wad, WadNode};

/// A decoded resource.
///
/// Implemented for every `Debug + Send + Sync` type, so decoders can return
/// their own structs and callers downcast with [`Wad::get_as`] or
/// [`downcast_ref`](Self::downcast_ref).
pub trait Resource: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync + fmt::Debug> Resource for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl dyn Resource {
    /// Borrow the payload as a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Whether the payload is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Shared handle to a decoded resource.
pub type Payload = Arc<dyn Resource>;

/// Decoder signature.
///
/// The reader covers exactly the node's payload; the archive and node are
/// passed so a decoder can look up resources it references by name.
pub type DecodeFn =
    dyn Fn(&Wad, &WadNode, BinaryReader<'_>) -> Result<Payload, BoxError> + Send + Sync;

/// Table of decoders by format tag.
#[derive(Default)]
pub struct Registry {
    decoders: FxHashMap<u32, Box<DecodeFn>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `decoder` for `format`, replacing any earlier registration.
    pub fn register<F>(&mut self, format: u32, decoder: F) -> &mut Self
    where
        F: Fn(&Wad, &WadNode, BinaryReader<'_>) -> Result<Payload, BoxError>
            + Send
            + Sync
            + 'static,
    {
        if self.decoders.insert(format, Box::new(decoder)).is_some() {
            tracing::warn!("decoder for format {format:#010x} replaced");
        }
        self
    }

    /// Decoder for a format tag.
    #[inline]
    pub fn get(&self, format: u32) -> Option<&DecodeFn> {
        self.decoders.get(&format).map(|d| d.as_ref())
    }

    #[inline]
    pub fn contains(&self, format: u32) -> bool {
        self.decoders.contains_key(&format)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Registered format tags in ascending order.
    pub fn formats(&self) -> Vec<u32> {
        let mut formats: Vec<u32> = self.decoders.keys().copied().collect();
        formats.sort_unstable();
        formats
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("formats", &self.formats())
            .finish()
    }
}
