//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → stop accepting → drain connections → flush recorder → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
