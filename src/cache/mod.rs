//! Two-tier HTTP response cache.
//!
//! The cache sits between a transport adapter and a [`Resolver`] that can
//! produce origin responses. Lookups flow memory tier first, then disk;
//! the disk tier is the source of truth and survives restarts unless the
//! cache is opened ephemeral.
//!
//! # Protocol
//!
//! For each request, [`HttpCache::do_cached`] derives a canonical cache
//! key, evaluates staleness for the negotiated variant, populates from the
//! resolver when needed (serialized per key so cold keys cannot stampede
//! the origin), and renders the stored variant with conditional-GET
//! support.
//!
//! # Degradation
//!
//! Disk I/O failures are logged and treated as cache misses; a failure in
//! the cache never blocks the underlying resource from being served.

mod disk;
mod entry;
mod http_cache;
mod key;
mod memory;
mod request;
mod response;
mod vary;

pub use disk::DiskCache;
pub use entry::{format_http_date, parse_http_date, CachedResponse};
pub use http_cache::{
    CacheStats, CachedEntity, HttpCache, HttpCacheConfig, Resolver, DEFAULT_TTL,
};
pub use key::CacheKey;
pub use memory::{MemoryCache, DEFAULT_MEMORY_CAPACITY};
pub use request::CacheRequest;
pub use response::{CapturedResponse, ResponseSink};
pub use vary::{VaryIndex, ANY_VARIANT_KEY};
