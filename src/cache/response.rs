//! Response sink seam and the capturing wrapper.
//!
//! Resolvers write into a [`ResponseSink`], never into a transport type.
//! During a cache miss the cache hands the resolver a [`CapturedResponse`]
//! that buffers everything until cacheability can be determined: a
//! cacheable result is committed to storage, anything else is replayed
//! verbatim into the live sink without disturbing previously cached
//! variants.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue, VARY};
use http::StatusCode;

use super::entry::CachedResponse;
use super::request::has_cache_directive;

// =============================================================================
// ResponseSink
// =============================================================================

/// Write-side view of a response.
///
/// This is the only surface a resolver sees; the cache and the transport
/// adapters both implement it.
pub trait ResponseSink: Send {
    /// Set the response status.
    fn set_status(&mut self, status: StatusCode);

    /// Set a header, replacing any existing values.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Append a header value, keeping existing ones.
    fn add_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Append body bytes.
    fn write(&mut self, chunk: &[u8]);
}

// =============================================================================
// CapturedResponse
// =============================================================================

/// Buffers a resolver's output until cacheability is determined.
#[derive(Debug)]
pub struct CapturedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl CapturedResponse {
    /// An empty capture with a 200 status.
    pub fn new() -> Self {
        CapturedResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// The captured status.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The captured headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The captured body so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the captured response may be stored.
    ///
    /// Only complete 200 responses are cacheable, and only when the origin
    /// did not opt out: `Vary: *` makes every request its own variant, and
    /// `no-store`, `no-cache` and `must-revalidate` forbid reuse.
    pub fn is_cacheable(&self) -> bool {
        if self.status != StatusCode::OK {
            return false;
        }
        let vary_star = self
            .headers
            .get_all(VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|name| name.trim() == "*");
        if vary_star {
            return false;
        }
        !has_cache_directive(&self.headers, "no-store")
            && !has_cache_directive(&self.headers, "no-cache")
            && !has_cache_directive(&self.headers, "must-revalidate")
    }

    /// Replay the captured status, headers and body into a live sink.
    pub fn replay(&self, sink: &mut dyn ResponseSink) {
        sink.set_status(self.status);
        for (name, value) in self.headers.iter() {
            sink.add_header(name.clone(), value.clone());
        }
        sink.write(&self.body);
    }

    /// Decompose into status, headers and body, for transport adapters.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, Bytes::from(self.body))
    }

    /// Freeze the capture into an immutable cached response.
    pub fn into_cached(self, cached_at: DateTime<Utc>) -> CachedResponse {
        CachedResponse::new(
            self.status,
            self.headers,
            Bytes::from(self.body),
            cached_at,
        )
    }
}

impl Default for CapturedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for CapturedResponse {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CACHE_CONTROL, CONTENT_TYPE};

    fn ok_capture() -> CapturedResponse {
        let mut captured = CapturedResponse::new();
        captured.set_status(StatusCode::OK);
        captured.set_header(CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
        captured.write(b"jpeg bytes");
        captured
    }

    #[test]
    fn test_capture_buffers_everything() {
        let captured = ok_capture();
        assert_eq!(captured.status(), StatusCode::OK);
        assert_eq!(
            captured.headers().get(CONTENT_TYPE).unwrap(),
            "image/jpeg"
        );
        assert_eq!(captured.body(), b"jpeg bytes");
    }

    #[test]
    fn test_ok_response_is_cacheable() {
        assert!(ok_capture().is_cacheable());
    }

    #[test]
    fn test_non_200_not_cacheable() {
        let mut captured = ok_capture();
        captured.set_status(StatusCode::NOT_FOUND);
        assert!(!captured.is_cacheable());
    }

    #[test]
    fn test_vary_star_not_cacheable() {
        let mut captured = ok_capture();
        captured.set_header(VARY, HeaderValue::from_static("*"));
        assert!(!captured.is_cacheable());
    }

    #[test]
    fn test_vary_header_list_is_cacheable() {
        let mut captured = ok_capture();
        captured.set_header(VARY, HeaderValue::from_static("Accept, Accept-Encoding"));
        assert!(captured.is_cacheable());
    }

    #[test]
    fn test_cache_control_directives_block_caching() {
        for directive in ["no-store", "no-cache", "must-revalidate"] {
            let mut captured = ok_capture();
            captured.set_header(
                CACHE_CONTROL,
                HeaderValue::from_str(&format!("public, {directive}")).unwrap(),
            );
            assert!(!captured.is_cacheable(), "{directive} should block caching");
        }
    }

    #[test]
    fn test_replay_copies_all_state() {
        let captured = ok_capture();
        let mut target = CapturedResponse::new();
        captured.replay(&mut target);
        assert_eq!(target.status(), StatusCode::OK);
        assert_eq!(target.headers().get(CONTENT_TYPE).unwrap(), "image/jpeg");
        assert_eq!(target.body(), b"jpeg bytes");
    }

    #[test]
    fn test_add_header_keeps_multiple_values() {
        let mut captured = CapturedResponse::new();
        captured.add_header(VARY, HeaderValue::from_static("Accept"));
        captured.add_header(VARY, HeaderValue::from_static("Accept-Language"));
        assert_eq!(captured.headers().get_all(VARY).iter().count(), 2);
    }

    #[test]
    fn test_into_cached() {
        let cached = ok_capture().into_cached(Utc::now());
        assert_eq!(cached.status(), StatusCode::OK);
        assert_eq!(&cached.body()[..], b"jpeg bytes");
    }
}
