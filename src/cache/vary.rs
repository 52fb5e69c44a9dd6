//! Per-key content negotiation index.
//!
//! When an origin response carries a `Vary` header, one cache key holds
//! several variants, one per combination of the named request headers. The
//! [`VaryIndex`] records which combination maps to which stored variant
//! suffix, so negotiation never re-derives `Vary` logic per request.
//!
//! The index persists as a small `key=value` properties file next to the
//! variant blobs: the literal `Vary` list under `vary`, and one
//! `variant.<synthesized-key>=<suffix>` line per variant. Synthesized keys
//! are percent-encoded so arbitrary header values survive the format.

use std::collections::HashMap;

use super::request::CacheRequest;

/// Synthesized key for responses without `Vary` metadata.
pub const ANY_VARIANT_KEY: &str = "ANY";

/// Maps request-header combinations to stored variant suffixes for one
/// cache key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaryIndex {
    /// Lowercased header names from the response's `Vary` list
    vary: Vec<String>,
    /// Synthesized vary key to variant suffix
    variants: HashMap<String, String>,
}

impl VaryIndex {
    /// An empty index.
    pub fn new() -> Self {
        VaryIndex::default()
    }

    /// Whether no variants are registered.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The current `Vary` header names.
    pub fn vary(&self) -> &[String] {
        &self.vary
    }

    /// Synthesize the vary key for a request against the stored `Vary`
    /// list.
    pub fn vary_key(&self, request: &CacheRequest) -> String {
        if self.vary.is_empty() {
            return ANY_VARIANT_KEY.to_string();
        }
        let parts: Vec<String> = self
            .vary
            .iter()
            .map(|name| {
                let value = request.header_joined(name).unwrap_or_default();
                format!("{}={}", name, urlencoding::encode(&value))
            })
            .collect();
        parts.join(";")
    }

    /// Find the stored variant suffix for a request.
    ///
    /// Requests without a matching combination fall back to the "any"
    /// default variant.
    pub fn lookup(&self, request: &CacheRequest) -> Option<&str> {
        let key = self.vary_key(request);
        self.variants
            .get(&key)
            .or_else(|| self.variants.get(ANY_VARIANT_KEY))
            .map(String::as_str)
    }

    /// Register the variant for a freshly resolved response.
    ///
    /// Adopts the response's `Vary` list (the latest response wins), then
    /// maps the request's combination to a suffix derived from
    /// `suffix_hint`, disambiguated with a numeric tail when another
    /// combination already claimed it. Returns the suffix to store under.
    pub fn assign(
        &mut self,
        vary_names: &[String],
        request: &CacheRequest,
        suffix_hint: &str,
    ) -> String {
        self.vary = vary_names.iter().map(|n| n.to_ascii_lowercase()).collect();

        let key = self.vary_key(request);
        if let Some(existing) = self.variants.get(&key) {
            return existing.clone();
        }

        let mut suffix = suffix_hint.to_string();
        let mut attempt = 0u32;
        while self.variants.values().any(|taken| taken == &suffix) {
            attempt += 1;
            suffix = format!("{suffix_hint}{attempt}");
        }
        self.variants.insert(key, suffix.clone());
        suffix
    }

    /// Serialize to the properties format.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push_str("vary=");
        out.push_str(&self.vary.join(","));
        out.push('\n');

        let mut lines: Vec<String> = self
            .variants
            .iter()
            .map(|(key, suffix)| format!("variant.{}={}", urlencoding::encode(key), suffix))
            .collect();
        lines.sort();
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Parse the properties format, ignoring unrecognized lines.
    pub fn decode(text: &str) -> VaryIndex {
        let mut index = VaryIndex::new();
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key == "vary" {
                index.vary = value
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(|n| n.to_ascii_lowercase())
                    .collect();
            } else if let Some(encoded) = key.strip_prefix("variant.") {
                let decoded = urlencoding::decode(encoded)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| encoded.to_string());
                index.variants.insert(decoded, value.to_string());
            }
        }
        index
    }
}

// =============================================================================
// Tests
// =============================================================================
