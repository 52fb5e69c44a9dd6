//! Transport-independent request view.
//!
//! The cache never touches a live connection: it sees requests through
//! [`CacheRequest`], a read-only snapshot of the attributes that matter for
//! caching (method, path, ordered multi-valued headers, query parameters,
//! server identity). Adapters at the edge build one of these from whatever
//! transport is in play.

use http::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL};
use http::Method;

/// A read-only view of an inbound request.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    parameters: Vec<(String, String)>,
    server_name: String,
    server_port: u16,
}

impl CacheRequest {
    /// Create a request with the given method and decoded path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        CacheRequest {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            parameters: Vec::new(),
            server_name: "localhost".to_string(),
            server_port: 80,
        }
    }

    /// Append a header value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Append a query parameter, preserving insertion order.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Set the server name and port.
    pub fn with_server(mut self, name: impl Into<String>, port: u16) -> Self {
        self.server_name = name.into();
        self.server_port = port;
        self
    }

    /// Replace the full header map.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The request method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The decoded request path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All request headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Query parameters in insertion order.
    #[inline]
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// The server name the request was addressed to.
    #[inline]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// The server port the request was addressed to.
    #[inline]
    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    /// First value of the named header, if it is valid UTF-8.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All values of the named header joined with commas.
    pub fn header_joined(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(","))
        }
    }

    /// Whether this request may be served from cache.
    ///
    /// A request carrying `Cache-Control: no-cache` or `no-store` bypasses
    /// the cache entirely.
    pub fn is_cacheable(&self) -> bool {
        !has_cache_directive(&self.headers, "no-cache")
            && !has_cache_directive(&self.headers, "no-store")
    }
}

/// Whether any `Cache-Control` value carries the given directive.
pub(crate) fn has_cache_directive(headers: &HeaderMap, directive: &str) -> bool {
    headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|part| {
            let part = part.trim();
            let name = part.split('=').next().unwrap_or(part);
            name.eq_ignore_ascii_case(directive)
        })
}

/// Value of a `Cache-Control` directive such as `max-age=60`, if present.
pub(crate) fn cache_directive_value(headers: &HeaderMap, directive: &str) -> Option<String> {
    headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|part| {
            let part = part.trim();
            let mut split = part.splitn(2, '=');
            let name = split.next()?;
            if name.trim().eq_ignore_ascii_case(directive) {
                split.next().map(|v| v.trim().trim_matches('"').to_string())
            } else {
                None
            }
        })
}

// =============================================================================
// Tests
// =============================================================================
