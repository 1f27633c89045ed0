//! Incremental build cache and dependency invalidation.
//!
//! This crate decides, for every source file on every build cycle, whether
//! work can be skipped. It combines a two-tier cache (an expiring in-process
//! memory tier over a durable JSON document), file fingerprinting, and a
//! one-level dependency graph used to cascade invalidation. All reads are
//! fail-safe: corruption or I/O problems degrade to "changed", never to a
//! hard failure or a stale skip.

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod fingerprint;
pub mod graph;
mod memory;
pub mod store;

pub use document::{CacheDocument, CacheEntry};
pub use error::CacheError;
pub use fingerprint::Fingerprinter;
pub use graph::DependencyGraph;
pub use store::{BuildCache, CacheStats};
