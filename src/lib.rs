//! # tiffserve
//!
//! A TIFF metadata codec and caching image delivery server.
//!
//! Two largely independent subsystems make up the library:
//!
//! - [`tiff`] - a synchronous TIFF/BigTIFF *metadata* codec: a lenient
//!   reader and a byte-exact writer over random-access sources, plus the
//!   [`Rational`](tiff::Rational) and [`Half`](tiff::Half) value types.
//! - [`cache`] - an asynchronous two-tier (memory + disk) HTTP response
//!   cache with Vary-based content negotiation, staleness evaluation,
//!   conditional-GET rendering, and per-key single-flight population.
//!
//! The [`server`] module wires both into an axum application: images are
//! served from an origin directory through the cache, and the TIFF
//! directory structure of origin files is exposed as JSON.
//!
//! ## Example
//!
//! ```no_run
//! use tiffserve::cache::{HttpCache, HttpCacheConfig};
//! use tiffserve::server::{create_router, AppState, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = HttpCache::new(HttpCacheConfig::new("./cache"))
//!         .await
//!         .expect("cache directory");
//!     let state = AppState::new(cache, "./images");
//!     let router = create_router(state, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
//!         .await
//!         .expect("bind");
//!     axum::serve(listener, router).await.expect("serve");
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod server;
pub mod tiff;

// Re-export commonly used types
pub use cache::{
    CacheKey, CacheRequest, CacheStats, CachedEntity, CachedResponse, CapturedResponse, HttpCache,
    HttpCacheConfig, MemoryCache, Resolver, ResponseSink, VaryIndex,
};
pub use config::Config;
pub use error::{CacheError, TiffError};
pub use server::{create_router, AppState, FileResolver, RouterConfig};
pub use tiff::{
    tag, tag_name, ByteOrder, Directory, Entry, Half, Ifd, RangeSource, Rational, TiffReader,
    TiffType, TiffWriter, Value,
};
