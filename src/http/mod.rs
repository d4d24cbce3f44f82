//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum catch-all handler)
//!     → routing::path (upstream URL)
//!     → headers.rs (forwarded / removed split)
//!     → forward.rs (upstream call, redirects off, timeouts)
//!     → headers.rs (drop framing headers from the response)
//!     → capture.rs (relay chunk-by-chunk, capture for the record)
//!     → response.rs (streamed response to client)
//!     → recorder (record submitted when the stream ends)
//! ```

pub mod capture;
pub mod forward;
pub mod headers;
pub mod response;
pub mod server;

pub use capture::{CaptureStream, StreamEnd};
pub use forward::{ForwardError, ForwardingEngine, OutboundRequest, UpstreamResponse};
pub use headers::{filter_request_headers, filter_response_headers, FilteredHeaders};
pub use server::{AppState, HttpServer, ServerError};
