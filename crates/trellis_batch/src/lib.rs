//! Chunked file processing with per-file failure isolation.
//!
//! [`FileProcessor`] applies a caller-supplied operation to a list of files.
//! Large sets are partitioned into chunks and fanned out across a bounded
//! worker pool; small sets (or a disabled pool) run in ordered micro-batches.
//! A failing or panicking operation never takes down the batch: it becomes a
//! per-file failure record, and if the chunk fan-out itself cannot run, the
//! whole set is retried on the micro-batch path.

#![warn(missing_docs)]

pub mod error;
pub mod outcome;
pub mod processor;

pub use error::BatchError;
pub use outcome::FileOutcome;
pub use processor::FileProcessor;
