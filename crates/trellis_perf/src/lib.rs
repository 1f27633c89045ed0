//! Build performance tracking.
//!
//! Stage stopwatches for the current run, a rolling history of past builds,
//! and a simple per-stage trend analysis. The tracker's durable state is a
//! JSON snapshot reloaded across runs; it is diagnostic only and never feeds
//! back into scheduling decisions.

#![warn(missing_docs)]

pub mod error;
pub mod history;
pub mod tracker;

pub use error::PerfError;
pub use history::{BuildHistory, BuildHistoryRecord, StageTrend};
pub use tracker::{BuildReport, OptimizationNote, PerformanceSample, PerformanceTracker};
