//! Process-lifetime metadata caches
//!
//! Two caches partition their entries per device ordinal: the shape cache
//! (descriptor to shape-info buffer) and the tad cache (tad descriptor to
//! [`TadPack`](crate::buffer::TadPack)). Entries are never evicted; a
//! descriptor resolves to the identical shared buffer for the life of the
//! process.
//!
//! There is no global instance. A [`CacheContext`] is built once at
//! runtime-context initialization and passed by shared handle to every
//! consumer.

mod shape_cache;
mod tad_cache;

pub use shape_cache::ShapeCache;
pub use tad_cache::{TadCache, TadDescriptor};

use crate::runtime::Runtime;
use std::sync::Arc;

/// Ownership bundle wiring the metadata caches together
///
/// The tad cache canonicalizes every tad shape buffer through the shape
/// cache, so the two share one [`ShapeCache`] instance.
pub struct CacheContext<R: Runtime> {
    shapes: Arc<ShapeCache<R>>,
    tads: TadCache<R>,
}

impl<R: Runtime> CacheContext<R> {
    /// Create the caches for this runtime's devices
    pub fn new() -> Self {
        let shapes = Arc::new(ShapeCache::new());
        let tads = TadCache::new(Arc::clone(&shapes));
        Self { shapes, tads }
    }

    /// The shape-info cache
    #[inline]
    pub fn shapes(&self) -> &ShapeCache<R> {
        &self.shapes
    }

    /// The TAD cache
    #[inline]
    pub fn tads(&self) -> &TadCache<R> {
        &self.tads
    }
}

impl<R: Runtime> Default for CacheContext<R> {
    fn default() -> Self {
        Self::new()
    }
}
