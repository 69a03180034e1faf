//! LRU cache of completed renders, keyed by output size

use std::num::NonZeroUsize;

use lru::LruCache;

use super::types::{PageSet, RenderSize};

/// Completed full-document renders, evicting the least recently used.
///
/// Only whole page sets are ever inserted. Reads and writes both count as
/// use. Not synchronised: the rasterizer touches it from the display thread
/// only.
pub struct RenderCache {
    cache: LruCache<RenderSize, PageSet>,
}

impl RenderCache {
    /// Create a new cache with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Check if a size is cached without promoting it
    #[must_use]
    pub fn contains(&self, size: &RenderSize) -> bool {
        self.cache.contains(size)
    }

    /// Get a cached page set, promoting it to most recently used
    #[must_use]
    pub fn get(&mut self, size: &RenderSize) -> Option<PageSet> {
        self.cache.get(size).cloned()
    }

    /// Insert or overwrite, evicting the least recently used entry when full.
    ///
    /// Returns the evicted size, if any.
    pub fn put(&mut self, size: RenderSize, pages: PageSet) -> Option<RenderSize> {
        match self.cache.push(size, pages) {
            Some((evicted, _)) if evicted != size => Some(evicted),
            _ => None,
        }
    }

    /// Number of cached renders
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Cache capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Cached sizes, most recently used first
    pub fn sizes(&self) -> impl Iterator<Item = &RenderSize> {
        self.cache.iter().map(|(k, _)| k)
    }
}
