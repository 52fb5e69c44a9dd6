//! Deterministic cache-key generation.
//!
//! Two logically identical requests must map to the same key no matter how
//! their query parameters are ordered, so the key is built from the decoded
//! path plus a canonical parameter encoding: parameters sorted by name,
//! then by value, each component percent-encoded. Requests without
//! parameters use a fixed sentinel so the parameterless form is still
//! distinguishable from an empty query string.

use super::request::CacheRequest;

/// Sentinel appended when the request has no query parameters.
const NO_PARAMS: &str = "default";

/// A normalized cache key for one logical resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a request.
    pub fn from_request(request: &CacheRequest) -> Self {
        let mut parameters: Vec<&(String, String)> = request.parameters().iter().collect();
        parameters.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let suffix = if parameters.is_empty() {
            NO_PARAMS.to_string()
        } else {
            parameters
                .iter()
                .map(|(name, value)| {
                    format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
                })
                .collect::<Vec<_>>()
                .join("&")
        };

        CacheKey(format!("{}?{}", request.path(), suffix))
    }

    /// The key string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe stem for the disk tier.
    pub fn file_stem(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
