//! Content-addressed cache of compiled diagrams using moka.
//!
//! Entries are keyed by notation and content digest and are never
//! invalidated; the least recently used entry is evicted once the
//! configured capacity is reached.

use std::sync::Arc;

use log::trace;
use moka::{policy::EvictionPolicy, sync::Cache};

use trazo_core::Notation;

use crate::CompiledDiagram;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    notation: Notation,
    digest: String,
}

/// Thread-safe LRU cache of successful compilations.
#[derive(Clone)]
pub(crate) struct DiagramCache {
    inner: Cache<CacheKey, Arc<CompiledDiagram>>,
}

impl DiagramCache {
    /// Creates a cache holding up to `capacity` diagrams, or `None` when
    /// `capacity` is zero.
    pub fn new(capacity: u64) -> Option<Self> {
        (capacity > 0).then(|| Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
        })
    }

    pub fn get(&self, notation: Notation, digest: &str) -> Option<Arc<CompiledDiagram>> {
        let hit = self.inner.get(&CacheKey {
            notation,
            digest: digest.to_string(),
        });
        trace!(notation = notation.as_str(), hit = hit.is_some(); "Cache lookup");
        hit
    }

    pub fn insert(&self, diagram: Arc<CompiledDiagram>) {
        let key = CacheKey {
            notation: diagram.notation(),
            digest: diagram.content_digest().to_string(),
        };
        self.inner.insert(key, diagram);
    }

    /// Number of cached diagrams after pending maintenance has run.
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}
