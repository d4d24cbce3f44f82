//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, the diagnostic stream)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stderr/stdout log lines
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (request_id, url, status) on every proxy event
//! - Metrics are cheap no-ops unless the exporter is installed

pub mod logging;
pub mod metrics;
