//! Transaction record model.

use axum::http::HeaderMap;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Body marker used when a payload could not be captured as text.
pub const UNDECODABLE_BODY: &str = "[Binary data]";

/// Header snapshot as stored in a record: lower-case name to value.
pub type HeaderRecord = BTreeMap<String, String>;

/// One persisted request/response cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Wall-clock instant the request began processing.
    pub timestamp: DateTime<Local>,
    pub request: RequestRecord,
    pub response: ResponseRecord,
    /// Request start to end of the response stream.
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: String,
    /// Upstream URL after normalization.
    pub url: String,
    #[serde(alias = "client_ip")]
    pub client_address: String,
    pub headers_sent: HeaderRecord,
    pub headers_removed: HeaderRecord,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub status_code: u16,
    pub headers: HeaderRecord,
    pub body: String,
}

/// Best-effort text form of a captured body; invalid UTF-8 is replaced.
pub fn body_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Snapshot a header map. Repeated headers are joined with ", ".
pub fn header_record(headers: &HeaderMap) -> HeaderRecord {
    let mut record = HeaderRecord::new();
    for (name, value) in headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes());
        record
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    record
}

/// Request half of a record, waiting for its response to finish.
#[derive(Debug)]
pub struct PendingTransaction {
    timestamp: DateTime<Local>,
    started: Instant,
    request: RequestRecord,
}

impl PendingTransaction {
    /// Start timing a transaction stamped at `timestamp`.
    pub fn started_at(
        timestamp: DateTime<Local>,
        started: Instant,
        request: RequestRecord,
    ) -> Self {
        Self {
            timestamp,
            started,
            request,
        }
    }

    /// Close the transaction with its response, fixing the duration.
    pub fn complete(self, response: ResponseRecord) -> TransactionRecord {
        TransactionRecord {
            timestamp: self.timestamp,
            request: self.request,
            response,
            duration_ms: self.started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}
