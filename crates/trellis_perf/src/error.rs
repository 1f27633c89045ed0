//! Error types for performance snapshot persistence.

use std::path::PathBuf;

/// Errors that can occur while saving the performance snapshot.
///
/// Loading is fail-safe and never produces an error; saving surfaces one so
/// the caller can log it and continue.
#[derive(Debug, thiserror::Error)]
pub enum PerfError {
    /// An I/O error occurred while writing the snapshot.
    #[error("performance log I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot could not be serialized.
    #[error("performance log serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
