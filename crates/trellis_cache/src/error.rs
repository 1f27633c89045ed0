//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache persistence.
///
/// Verdict computation itself is infallible by design (unreadable files are
/// simply "changed"); this enum covers the save path, where errors are
/// surfaced so the caller can log them and move on.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing the cache document.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error occurred.
    #[error("cache serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
