//! Recording forwarding proxy library.
//!
//! Forwards every request to a single upstream API, streams the response
//! back untouched and persists each request/response pair as its own
//! date-sharded JSON file. `viewer` browses those files.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod recorder;
pub mod routing;
pub mod viewer;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use recorder::{RecordStore, TransactionRecord};
