//! Disk cache tier.
//!
//! The durable tier and source of truth beyond the memory budget. Each
//! variant persists as two artifacts named after the percent-encoded cache
//! key:
//!
//! - `<stem>.<suffix>` — the raw body bytes (bare `<stem>` when the
//!   variant has no suffix)
//! - `<stem>.<suffix>.headers` — the header pseudo-properties dump
//!
//! plus, once per key, `<stem>.vary` holding the content negotiation
//! index. The cached-at instant is the body file's modification time, so
//! freshness survives process restarts for free.
//!
//! Every I/O failure here degrades to cache-miss behavior: reads return
//! `None`, writes report failure, both log, neither propagates. A broken
//! disk must never block the origin from being served.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::StatusCode;
use tracing::{debug, warn};

use super::entry::CachedResponse;
use super::key::CacheKey;
use super::vary::VaryIndex;
use crate::error::CacheError;

/// Filesystem-backed variant storage rooted at one directory.
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Open (and if needed create) a cache directory.
    ///
    /// An ephemeral cache wipes any previous contents so nothing survives
    /// the process.
    pub async fn open(root: impl Into<PathBuf>, ephemeral: bool) -> Result<Self, CacheError> {
        let root = root.into();
        if ephemeral {
            match tokio::fs::remove_dir_all(&root).await {
                Ok(()) => {}
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => return Err(error.into()),
            }
        }
        tokio::fs::create_dir_all(&root).await?;
        Ok(DiskCache { root })
    }

    /// The cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn body_path(&self, key: &CacheKey, suffix: &str) -> PathBuf {
        let stem = key.file_stem();
        if suffix.is_empty() {
            self.root.join(stem)
        } else {
            self.root.join(format!("{stem}.{suffix}"))
        }
    }

    fn headers_path(&self, key: &CacheKey, suffix: &str) -> PathBuf {
        let mut path = self.body_path(key, suffix).into_os_string();
        path.push(".headers");
        PathBuf::from(path)
    }

    fn vary_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}.vary", key.file_stem()))
    }

    /// Load a stored variant.
    ///
    /// Returns `None` for anything that prevents a complete load; the
    /// caller falls through to the origin.
    pub async fn read_variant(&self, key: &CacheKey, suffix: &str) -> Option<CachedResponse> {
        let body_path = self.body_path(key, suffix);

        let body = match tokio::fs::read(&body_path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
            Err(error) => {
                warn!(path = %body_path.display(), %error, "failed to read cached body");
                return None;
            }
        };

        let headers_text = match tokio::fs::read_to_string(self.headers_path(key, suffix)).await {
            Ok(text) => text,
            Err(error) => {
                warn!(key = key.as_str(), %error, "failed to read cached headers");
                return None;
            }
        };
        let headers = CachedResponse::decode_headers(&headers_text);

        let cached_at = match tokio::fs::metadata(&body_path).await.and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(error) => {
                warn!(key = key.as_str(), %error, "failed to read cached mtime");
                return None;
            }
        };

        // Only complete 200 responses are ever stored
        Some(CachedResponse::new(StatusCode::OK, headers, body, cached_at))
    }

    /// Persist a variant. Failures are logged and reported, not thrown.
    pub async fn write_variant(
        &self,
        key: &CacheKey,
        suffix: &str,
        response: &CachedResponse,
    ) -> bool {
        let body_path = self.body_path(key, suffix);
        if let Err(error) = tokio::fs::write(&body_path, response.body()).await {
            warn!(path = %body_path.display(), %error, "failed to write cached body");
            return false;
        }
        if let Err(error) =
            tokio::fs::write(self.headers_path(key, suffix), response.encode_headers()).await
        {
            warn!(key = key.as_str(), %error, "failed to write cached headers");
            return false;
        }
        debug!(key = key.as_str(), suffix, "variant written to disk");
        true
    }

    /// Load the per-key content negotiation index.
    pub async fn read_vary(&self, key: &CacheKey) -> Option<VaryIndex> {
        match tokio::fs::read_to_string(self.vary_path(key)).await {
            Ok(text) => Some(VaryIndex::decode(&text)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
            Err(error) => {
                warn!(key = key.as_str(), %error, "failed to read vary index");
                None
            }
        }
    }

    /// Persist the per-key content negotiation index.
    pub async fn write_vary(&self, key: &CacheKey, index: &VaryIndex) -> bool {
        match tokio::fs::write(self.vary_path(key), index.encode()).await {
            Ok(()) => true,
            Err(error) => {
                warn!(key = key.as_str(), %error, "failed to write vary index");
                false
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
