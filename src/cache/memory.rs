//! In-memory cache tier.
//!
//! A size-accounted LRU over cached response variants. Eviction is driven
//! by a byte budget, not an entry count: each stored response is weighed by
//! its body and header size, and least-recently-used entries are dropped
//! until the total fits. The disk tier remains the source of truth, so an
//! eviction here is only a speed loss.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::RwLock;

use super::entry::CachedResponse;

/// Default memory budget: 64MB
pub const DEFAULT_MEMORY_CAPACITY: usize = 64 * 1024 * 1024;

/// Default maximum number of entries (bounds LRU bookkeeping)
const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Size-bounded LRU of cached response variants, keyed by variant id.
///
/// Thread-safe; share across tasks via `Arc`.
pub struct MemoryCache {
    cache: RwLock<LruCache<String, Arc<CachedResponse>>>,
    max_size: usize,
    current_size: RwLock<usize>,
}

impl MemoryCache {
    /// Create a cache with the default byte budget.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    /// Create a cache with the given byte budget.
    pub fn with_capacity(max_size: usize) -> Self {
        let entries = NonZeroUsize::new(DEFAULT_MAX_ENTRIES).expect("constant is non-zero");
        MemoryCache {
            cache: RwLock::new(LruCache::new(entries)),
            max_size,
            current_size: RwLock::new(0),
        }
    }

    /// Get a variant, marking it recently used.
    pub async fn get(&self, variant_id: &str) -> Option<Arc<CachedResponse>> {
        let mut cache = self.cache.write().await;
        cache.get(variant_id).cloned()
    }

    /// Store a variant, evicting least-recently-used entries while the
    /// byte budget is exceeded.
    pub async fn put(&self, variant_id: String, response: Arc<CachedResponse>) {
        let weight = response.size_in_bytes();
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        if let Some(previous) = cache.peek(&variant_id) {
            *current_size = current_size.saturating_sub(previous.size_in_bytes());
        }

        cache.put(variant_id, response);
        *current_size += weight;

        while *current_size > self.max_size {
            match cache.pop_lru() {
                Some((_, evicted)) => {
                    *current_size = current_size.saturating_sub(evicted.size_in_bytes());
                }
                None => break,
            }
        }
    }

    /// Remove a variant.
    pub async fn remove(&self, variant_id: &str) -> Option<Arc<CachedResponse>> {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;
        let removed = cache.pop(variant_id)?;
        *current_size = current_size.saturating_sub(removed.size_in_bytes());
        Some(removed)
    }

    /// Drop all entries.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;
        cache.clear();
        *current_size = 0;
    }

    /// Number of cached variants.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Current accounted size in bytes.
    pub async fn size(&self) -> usize {
        *self.current_size.read().await
    }

    /// The configured byte budget.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
