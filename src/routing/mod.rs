//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → path.rs (strip one API-version prefix)
//!     → Return: full upstream URL
//! ```
//!
//! # Design Decisions
//! - Single upstream: routing is pure prefix rewriting
//! - Deterministic: same input always maps to the same URL
//! - First match wins (prefixes ordered longest first)

pub mod path;

pub use path::{normalize_path, PathNormalizer, STRIPPED_PREFIXES};
