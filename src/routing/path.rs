//! Path normalization.
//!
//! # Responsibilities
//! - Strip one known API-version prefix from the inbound path
//! - Join the remaining tail onto the upstream base URL
//!
//! # Design Decisions
//! - Prefixes are checked longest first; only one is ever stripped
//! - No percent-decoding, segment validation or traversal checks
//! - Query string is carried over verbatim

/// Known API-version prefixes, in match order.
pub const STRIPPED_PREFIXES: [&str; 2] = ["api/v1/", "v1/"];

/// Strip at most one known prefix from a path tail (no leading slash).
pub fn normalize_path(tail: &str) -> &str {
    STRIPPED_PREFIXES
        .iter()
        .find_map(|prefix| tail.strip_prefix(prefix))
        .unwrap_or(tail)
}

/// Maps inbound request paths to upstream URLs.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    base_url: String,
}

impl PathNormalizer {
    /// Create a normalizer for the given upstream base URL.
    /// A trailing slash on the base is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the upstream URL for an inbound URI path and optional query.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> String {
        let tail = path.strip_prefix('/').unwrap_or(path);
        let tail = normalize_path(tail);
        match query {
            Some(q) => format!("{}/{}?{}", self.base_url, tail, q),
            None => format!("{}/{}", self.base_url, tail),
        }
    }
}
