//! The immutable stored artifact and its freshness rules.
//!
//! A [`CachedResponse`] is one specific content-negotiation variant of one
//! URI: status, ordered headers, body bytes, and the instant it was cached.
//! It exists only once resolution completed and the response was judged
//! cacheable; after that it never changes.
//!
//! # Header persistence format
//!
//! Headers serialize to a newline-delimited pseudo-properties dump,
//! `Name: value1\value2\...`, with repeated header values joined by a
//! backslash and literal backslashes doubled. The format is append-only
//! text so a cache directory stays inspectable with ordinary tools.

use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, EXPIRES, LAST_MODIFIED};
use http::StatusCode;
use std::time::Duration;
use tracing::debug;

use super::request::cache_directive_value;

// =============================================================================
// HTTP dates
// =============================================================================

/// Format an instant as an RFC 1123 HTTP date.
pub fn format_http_date(instant: DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an RFC 1123 HTTP date.
///
/// Returns `None` for malformed input; callers treat that as "no header
/// present" rather than an error.
pub fn parse_http_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

// =============================================================================
// CachedResponse
// =============================================================================

/// An immutable cached response variant.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    cached_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Create a cached response.
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        cached_at: DateTime<Utc>,
    ) -> Self {
        CachedResponse {
            status,
            headers,
            body,
            cached_at,
        }
    }

    /// The stored status.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The stored headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The stored body bytes.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// When this variant was cached.
    #[inline]
    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// Approximate memory footprint, used for size-accounted eviction.
    pub fn size_in_bytes(&self) -> usize {
        let header_bytes: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        self.body.len() + header_bytes
    }

    /// The stored `Content-Type`, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// When this variant stops being fresh.
    ///
    /// Resolution order: an explicit `Expires` header wins; otherwise
    /// `max-age` from `Cache-Control` counted from `Last-Modified` (or the
    /// cached instant when absent); otherwise the cached instant plus the
    /// configured default.
    pub fn expires_at(&self, default_ttl: Duration) -> DateTime<Utc> {
        if let Some(expires) = self
            .headers
            .get(EXPIRES)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date)
        {
            return expires;
        }

        if let Some(max_age) = cache_directive_value(&self.headers, "max-age")
            .and_then(|v| v.parse::<i64>().ok())
        {
            let base = self
                .headers
                .get(LAST_MODIFIED)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_http_date)
                .unwrap_or(self.cached_at);
            return base + ChronoDuration::seconds(max_age);
        }

        self.cached_at + ChronoDuration::seconds(default_ttl.as_secs() as i64)
    }

    /// Whether the freshness window has elapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, default_ttl: Duration) -> bool {
        now > self.expires_at(default_ttl)
    }

    /// Serialize the headers to the pseudo-properties dump format.
    pub fn encode_headers(&self) -> String {
        let mut out = String::new();
        let mut seen: Vec<&HeaderName> = Vec::new();
        for (name, _) in self.headers.iter() {
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            let joined: Vec<String> = self
                .headers
                .get_all(name)
                .iter()
                .map(|value| escape_value(&String::from_utf8_lossy(value.as_bytes())))
                .collect();
            out.push_str(name.as_str());
            out.push_str(": ");
            out.push_str(&joined.join("\\"));
            out.push('\n');
        }
        out
    }

    /// Rebuild a header map from the dump format, skipping malformed lines.
    pub fn decode_headers(text: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for line in text.lines() {
            let Some((name, values)) = line.split_once(": ") else {
                if !line.is_empty() {
                    debug!(line, "skipping malformed header line");
                }
                continue;
            };
            let Ok(name) = name.parse::<HeaderName>() else {
                debug!(name, "skipping invalid header name");
                continue;
            };
            for value in split_values(values) {
                if let Ok(value) = HeaderValue::from_str(&value) {
                    headers.append(name.clone(), value);
                }
            }
        }
        headers
    }
}

/// Double backslashes so a literal backslash survives the multi-value join.
fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\")
}

/// Split a joined multi-value on unescaped backslashes and unescape the
/// parts.
fn split_values(joined: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = joined.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('\\') => current.push('\\'),
                // Unescaped backslash separates values
                Some(next) => {
                    values.push(std::mem::take(&mut current));
                    current.push(next);
                }
                None => values.push(std::mem::take(&mut current)),
            }
        } else {
            current.push(c);
        }
    }
    values.push(current);
    values
}

// =============================================================================
// Tests
// =============================================================================
