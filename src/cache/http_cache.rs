//! Cache orchestration: lookup, staleness, population, rendering.
//!
//! [`HttpCache::do_cached`] is the single entry point. For each request it
//! derives a deterministic cache key, finds or creates the per-key
//! [`CachedEntity`], and serializes staleness-check-then-populate behind
//! that entity's lock so concurrent requests for the same cold key trigger
//! exactly one origin resolution (stampede protection). Requests for
//! different keys never contend.
//!
//! # Lock scopes
//!
//! Three independent scopes, none nested inside another's critical work:
//!
//! - the per-key entity lock, the only one held across the (potentially
//!   slow) resolver call
//! - the memory tier, short get/put sections only
//! - the per-key vary index, held across its read-modify-write so two
//!   variants registering concurrently cannot lose updates
//!
//! # Degradation
//!
//! Disk failures surface as cache misses. A resolver failure is the only
//! error a caller ever sees.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::header::{HeaderName, HeaderValue, IF_MODIFIED_SINCE, LAST_MODIFIED, VARY};
use http::{Method, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::disk::DiskCache;
use super::entry::{format_http_date, parse_http_date, CachedResponse};
use super::key::CacheKey;
use super::memory::{MemoryCache, DEFAULT_MEMORY_CAPACITY};
use super::request::CacheRequest;
use super::response::{CapturedResponse, ResponseSink};
use super::vary::VaryIndex;
use crate::error::CacheError;

/// Default freshness window when the origin sets no expiry: 1 hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

// =============================================================================
// Resolver
// =============================================================================

/// Produces the origin response for a request on a cache miss.
///
/// A resolver writes into the sink it is given and must run to completion
/// or failure; there is no cancellation path once population starts.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve the request into the response sink.
    async fn resolve(
        &self,
        request: &CacheRequest,
        response: &mut dyn ResponseSink,
    ) -> Result<(), CacheError>;
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for an [`HttpCache`].
#[derive(Debug, Clone)]
pub struct HttpCacheConfig {
    /// Directory for the disk tier
    pub cache_dir: PathBuf,

    /// Byte budget for the memory tier
    pub memory_capacity: usize,

    /// Freshness window when the origin sets no expiry
    pub default_ttl: Duration,

    /// Filesystem root backing the cached resources, when there is one.
    /// A backing file newer than a cached variant forces that variant
    /// stale.
    pub origin_root: Option<PathBuf>,

    /// Wipe the disk tier on startup instead of reusing it
    pub ephemeral: bool,
}

impl HttpCacheConfig {
    /// Configuration with defaults for everything but the directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        HttpCacheConfig {
            cache_dir: cache_dir.into(),
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            default_ttl: DEFAULT_TTL,
            origin_root: None,
            ephemeral: false,
        }
    }

    /// Set the memory tier byte budget.
    pub fn with_memory_capacity(mut self, bytes: usize) -> Self {
        self.memory_capacity = bytes;
        self
    }

    /// Set the default freshness window.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the filesystem root backing cached resources.
    pub fn with_origin_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.origin_root = Some(root.into());
        self
    }

    /// Wipe the disk tier on startup.
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
}

// =============================================================================
// Stats
// =============================================================================

#[derive(Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    resolves: AtomicU64,
}

/// A point-in-time view of cache activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from cache
    pub hits: u64,
    /// Requests that found no fresh variant
    pub misses: u64,
    /// Resolver invocations
    pub resolves: u64,
    /// Variants currently in the memory tier
    pub memory_entries: usize,
    /// Bytes currently accounted in the memory tier
    pub memory_bytes: usize,
}

// =============================================================================
// CachedEntity
// =============================================================================

/// The logical cache slot for one normalized request key.
///
/// Holds the key-scoped locks: the populate lock serializing
/// staleness-check-then-populate, and the lazily loaded vary index guarding
/// its own read-modify-write. Variant storage itself is delegated to the
/// cache tiers.
pub struct CachedEntity {
    key: CacheKey,
    populate: Mutex<()>,
    vary: Mutex<Option<VaryIndex>>,
}

impl CachedEntity {
    fn new(key: CacheKey) -> Self {
        CachedEntity {
            key,
            populate: Mutex::new(()),
            vary: Mutex::new(None),
        }
    }

    /// The normalized cache key this entity serves.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

// =============================================================================
// HttpCache
// =============================================================================

/// Two-tier HTTP response cache with content negotiation and conditional
/// GET support.
pub struct HttpCache {
    config: HttpCacheConfig,
    memory: MemoryCache,
    disk: DiskCache,
    entities: Mutex<HashMap<String, Arc<CachedEntity>>>,
    counters: CacheCounters,
}

impl HttpCache {
    /// Open a cache with the given configuration.
    pub async fn new(config: HttpCacheConfig) -> Result<Self, CacheError> {
        let disk = DiskCache::open(&config.cache_dir, config.ephemeral).await?;
        let memory = MemoryCache::with_capacity(config.memory_capacity);
        Ok(HttpCache {
            config,
            memory,
            disk,
            entities: Mutex::new(HashMap::new()),
            counters: CacheCounters::default(),
        })
    }

    /// Serve a request through the cache.
    ///
    /// Resolves from the origin only when no fresh variant exists, commits
    /// cacheable results to both tiers, writes non-cacheable results
    /// through untouched, and answers conditional requests with 304.
    pub async fn do_cached(
        &self,
        request: &CacheRequest,
        sink: &mut dyn ResponseSink,
        resolver: &dyn Resolver,
    ) -> Result<(), CacheError> {
        if !request.is_cacheable() {
            debug!(path = request.path(), "request bypasses cache");
            self.counters.resolves.fetch_add(1, Ordering::Relaxed);
            return resolver.resolve(request, sink).await;
        }

        let key = CacheKey::from_request(request);
        let entity = self.entity(&key).await;

        let response = {
            // Serialize staleness-check-then-populate per key; concurrent
            // requests for this key park here instead of stampeding the
            // origin
            let _populating = entity.populate.lock().await;

            match self.lookup_fresh(&entity, request).await {
                Some(found) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key = key.as_str(), "cache hit");
                    found
                }
                None => {
                    self.counters.misses.fetch_add(1, Ordering::Relaxed);
                    self.counters.resolves.fetch_add(1, Ordering::Relaxed);
                    debug!(key = key.as_str(), "cache miss, resolving");

                    let mut captured = CapturedResponse::new();
                    resolver.resolve(request, &mut captured).await?;

                    if captured.is_cacheable() {
                        let cached = Arc::new(captured.into_cached(Utc::now()));
                        self.commit(&entity, request, &cached).await;
                        cached
                    } else {
                        debug!(
                            key = key.as_str(),
                            status = captured.status().as_u16(),
                            "response not cacheable, writing through"
                        );
                        captured.replay(sink);
                        return Ok(());
                    }
                }
            }
        };

        self.render(request, &response, sink);
        Ok(())
    }

    /// A point-in-time snapshot of the cache counters and memory tier.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            resolves: self.counters.resolves.load(Ordering::Relaxed),
            memory_entries: self.memory.len().await,
            memory_bytes: self.memory.size().await,
        }
    }

    /// Find or create the entity for a key. Short critical section.
    async fn entity(&self, key: &CacheKey) -> Arc<CachedEntity> {
        let mut entities = self.entities.lock().await;
        entities
            .entry(key.as_str().to_string())
            .or_insert_with(|| Arc::new(CachedEntity::new(key.clone())))
            .clone()
    }

    /// Look up a fresh stored variant for the request, promoting disk hits
    /// into the memory tier.
    async fn lookup_fresh(
        &self,
        entity: &CachedEntity,
        request: &CacheRequest,
    ) -> Option<Arc<CachedResponse>> {
        let suffix = {
            let mut guard = entity.vary.lock().await;
            if guard.is_none() {
                *guard = Some(self.disk.read_vary(&entity.key).await.unwrap_or_default());
            }
            let index = guard.get_or_insert_with(VaryIndex::new);
            index.lookup(request)?.to_string()
        };

        let variant_id = variant_id(&entity.key, &suffix);
        let response = match self.memory.get(&variant_id).await {
            Some(found) => found,
            None => {
                let loaded = Arc::new(self.disk.read_variant(&entity.key, &suffix).await?);
                self.memory.put(variant_id, loaded.clone()).await;
                loaded
            }
        };

        if self.is_stale(request, &response).await {
            debug!(key = entity.key.as_str(), suffix = %suffix, "stored variant is stale");
            None
        } else {
            Some(response)
        }
    }

    /// Whether a stored variant can no longer be served.
    async fn is_stale(&self, request: &CacheRequest, response: &CachedResponse) -> bool {
        if response.is_expired(Utc::now(), self.config.default_ttl) {
            return true;
        }

        // A backing resource newer than the cached copy forces staleness
        if let Some(root) = &self.config.origin_root {
            let origin = root.join(request.path().trim_start_matches('/'));
            if let Ok(metadata) = tokio::fs::metadata(&origin).await {
                if let Ok(modified) = metadata.modified() {
                    if DateTime::<Utc>::from(modified) > response.cached_at() {
                        return true;
                    }
                }
            }
        }

        false
    }

    /// Commit a freshly resolved response to both tiers and register its
    /// negotiation variant.
    async fn commit(
        &self,
        entity: &CachedEntity,
        request: &CacheRequest,
        response: &Arc<CachedResponse>,
    ) {
        let vary_names: Vec<String> = response
            .headers()
            .get_all(VARY)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        let suffix = {
            // Read-modify-write of the vary index stays under its lock so
            // two variants registering concurrently cannot lose updates
            let mut guard = entity.vary.lock().await;
            if guard.is_none() {
                *guard = Some(self.disk.read_vary(&entity.key).await.unwrap_or_default());
            }
            let index = guard.get_or_insert_with(VaryIndex::new);
            let suffix = index.assign(&vary_names, request, &suffix_for(response.content_type()));
            if !self.disk.write_vary(&entity.key, index).await {
                warn!(key = entity.key.as_str(), "vary index not persisted");
            }
            suffix
        };

        // A failed disk write degrades to a memory-only entry; already
        // logged by the disk tier
        self.disk
            .write_variant(&entity.key, &suffix, response)
            .await;
        self.memory
            .put(variant_id(&entity.key, &suffix), response.clone())
            .await;
    }

    /// Emit a cached response, honoring conditional requests.
    fn render(&self, request: &CacheRequest, response: &CachedResponse, sink: &mut dyn ResponseSink) {
        let stale = response.is_expired(Utc::now(), self.config.default_ttl);

        if let Some(condition) = request.header(&IF_MODIFIED_SINCE) {
            match parse_http_date(condition) {
                Some(since) => {
                    if last_modified(response).timestamp() <= since.timestamp() {
                        sink.set_status(StatusCode::NOT_MODIFIED);
                        self.copy_headers(response, stale, sink);
                        return;
                    }
                }
                None => {
                    // Treated as "no conditional header present"
                    debug!(value = condition, "malformed If-Modified-Since ignored");
                }
            }
        }

        sink.set_status(response.status());
        self.copy_headers(response, stale, sink);
        if request.method() != Method::HEAD {
            sink.write(response.body());
        }
    }

    /// Copy stored headers into the sink, adding `Last-Modified` from the
    /// cached instant and a staleness warning when applicable.
    fn copy_headers(&self, response: &CachedResponse, stale: bool, sink: &mut dyn ResponseSink) {
        for (name, value) in response.headers().iter() {
            sink.add_header(name.clone(), value.clone());
        }
        if !response.headers().contains_key(LAST_MODIFIED) {
            if let Ok(value) = HeaderValue::from_str(&format_http_date(response.cached_at())) {
                sink.set_header(LAST_MODIFIED, value);
            }
        }
        if stale {
            sink.add_header(
                HeaderName::from_static("warning"),
                HeaderValue::from_static("110 tiffserve \"Response is stale\""),
            );
        }
    }
}

/// Memory tier key for one stored variant.
fn variant_id(key: &CacheKey, suffix: &str) -> String {
    format!("{}#{}", key.as_str(), suffix)
}

/// The modification instant a variant advertises: its stored
/// `Last-Modified` header when present, the cached instant otherwise.
/// Conditional requests echo this value back, so the comparison must use
/// the same source.
fn last_modified(response: &CachedResponse) -> DateTime<Utc> {
    response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_http_date)
        .unwrap_or_else(|| response.cached_at())
}

/// Variant file suffix derived from a negotiated content type:
/// `image/jpeg` becomes `jpeg`, absence becomes the bare stem.
fn suffix_for(content_type: Option<&str>) -> String {
    let Some(content_type) = content_type else {
        return String::new();
    };
    let subtype = content_type
        .split(';')
        .next()
        .and_then(|mime| mime.split('/').nth(1))
        .unwrap_or("");
    subtype
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
