//! Error types for batch orchestration.

/// Infrastructure failures of the chunked processing path.
///
/// These are distinct from per-file operation failures, which are isolated
/// into [`FileOutcome`](crate::FileOutcome) records. An orchestration error
/// means the chunked path could not run at all; the caller retries the whole
/// set on the micro-batch path.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The worker pool could not be constructed.
    #[error("worker pool construction failed: {reason}")]
    PoolBuild {
        /// Description of the pool failure.
        reason: String,
    },

    /// The chunk fan-out itself panicked outside any single operation.
    #[error("chunk fan-out failed: {reason}")]
    Orchestration {
        /// Description of the fan-out failure.
        reason: String,
    },
}
