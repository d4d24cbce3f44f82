//! Header filtering in both directions.
//!
//! # Responsibilities
//! - Drop the inbound Host header (the client sets the upstream's own)
//! - Strip referrer-style headers and keep them aside for the record
//! - Drop framing headers from upstream responses (the relay re-frames)
//!
//! # Design Decisions
//! - `HeaderMap` gives case-insensitive names and keeps repeated values
//! - Everything not named here passes through untouched, in order

use axum::http::header::{self, HeaderMap, HeaderName};

/// Request headers stripped before forwarding and recorded as removed.
pub const STRIPPED_REQUEST_HEADERS: [&str; 2] = ["http-referer", "referer"];

/// Response headers that describe the upstream's own framing.
pub const EXCLUDED_RESPONSE_HEADERS: [&str; 4] = [
    "content-encoding",
    "content-length",
    "transfer-encoding",
    "connection",
];

/// Result of filtering inbound headers.
#[derive(Debug, Default, Clone)]
pub struct FilteredHeaders {
    /// Headers sent upstream.
    pub forwarded: HeaderMap,
    /// Headers deliberately stripped, kept for audit.
    pub removed: HeaderMap,
}

fn is_stripped(name: &HeaderName) -> bool {
    STRIPPED_REQUEST_HEADERS
        .iter()
        .any(|h| name.as_str().eq_ignore_ascii_case(h))
}

/// Split inbound headers into forwarded and removed sets.
///
/// The two maps are disjoint; together with the dropped Host header they
/// contain every inbound value.
pub fn filter_request_headers(headers: &HeaderMap) -> FilteredHeaders {
    let mut filtered = FilteredHeaders::default();
    for (name, value) in headers.iter() {
        if name == header::HOST {
            continue;
        }
        let target = if is_stripped(name) {
            &mut filtered.removed
        } else {
            &mut filtered.forwarded
        };
        target.append(name.clone(), value.clone());
    }
    filtered
}

/// Whether an upstream response header is relayed to the client.
pub fn is_relayed_response_header(name: &HeaderName) -> bool {
    !EXCLUDED_RESPONSE_HEADERS
        .iter()
        .any(|h| name.as_str().eq_ignore_ascii_case(h))
}

/// Headers relayed back to the client, in upstream order.
pub fn filter_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if is_relayed_response_header(name) {
            relayed.append(name.clone(), value.clone());
        }
    }
    relayed
}
