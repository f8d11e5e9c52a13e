//! Structured trace-event formatting, enrichment and verification.
//!
//! The pipeline consumes already-decoded kernel trace events, attaches
//! container and Kubernetes identity to them, and renders them through
//! pluggable output formatters. A verification layer lets tests assert that
//! a captured event stream matches an expected set despite fields that vary
//! between runs (timestamps, PIDs, namespace ids).

#[macro_use]
extern crate tracing;

pub mod containers;
pub mod event;
pub mod formatters;
pub mod schema;
pub mod sources;
pub mod testing;
pub mod transforms;

#[cfg(test)]
pub mod test_util;

pub use event::{CommonData, Record, Value};

/// A boxed error for crate-level fallible APIs.
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A crate-level result type.
pub type Result<T> = std::result::Result<T, Error>;
