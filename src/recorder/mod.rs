//! Transaction recording subsystem.
//!
//! # Data Flow
//! ```text
//! request start
//!     → record.rs (PendingTransaction holds the request half)
//! response stream ends (complete, truncated or abandoned)
//!     → record.rs (complete → TransactionRecord)
//!     → writer.rs (RecorderHandle::submit, non-blocking)
//!     → writer.rs (Recorder task)
//!     → store.rs (date-sharded file, temp + rename)
//! ```
//!
//! # Design Decisions
//! - Each record is written exactly once and never modified
//! - Persistence failures are reported on the diagnostic log and dropped
//! - The writer drains its queue before shutdown completes

pub mod record;
pub mod store;
pub mod writer;

pub use record::{
    body_text, header_record, HeaderRecord, PendingTransaction, RequestRecord, ResponseRecord,
    TransactionRecord, UNDECODABLE_BODY,
};
pub use store::{record_key, PageEntry, RecordError, RecordPage, RecordStore};
pub use writer::{Recorder, RecorderHandle};
