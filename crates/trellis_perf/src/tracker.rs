//! Stage stopwatches and the persisted performance snapshot.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::PerfError;
use crate::history::{stage_trend, BuildHistory, BuildHistoryRecord, StageTrend};

/// One timed stage execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    /// The stage name.
    pub stage: String,
    /// How long the stage took.
    pub duration_ms: f64,
    /// When the stage finished (epoch milliseconds).
    pub timestamp: u64,
}

/// An entry in the append-only optimization log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationNote {
    /// Category of the optimization (e.g. "cache-skip").
    pub kind: String,
    /// Human-readable description.
    pub description: String,
    /// Estimated time saved.
    pub time_saved_ms: f64,
    /// When the note was added (epoch milliseconds).
    pub timestamp: u64,
}

/// Summary of the current run, produced by [`PerformanceTracker::get_report`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    /// Sum of all stage durations recorded this run.
    pub total_ms: f64,
    /// Per-stage durations for this run.
    pub steps: BTreeMap<String, f64>,
    /// Files processed this run.
    pub files_processed: usize,
    /// Cache hits this run.
    pub cache_hits: u64,
    /// Mean build duration across the retained history.
    pub rolling_average_ms: f64,
}

/// The tracker's durable state, serialized as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PerfSnapshot {
    /// Chronological samples per stage, across runs.
    samples: BTreeMap<String, Vec<PerformanceSample>>,
    /// Append-only optimization log.
    optimizations: Vec<OptimizationNote>,
    /// Rolling build history.
    history: BuildHistory,
}

/// Stage timers, build history, and trend analysis.
///
/// Stopwatches live only in memory for the current run; samples, the
/// optimization log, and the build history persist across runs through
/// [`save`](Self::save) / [`load_or_default`](Self::load_or_default).
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    timers: HashMap<String, Instant>,
    steps: BTreeMap<String, f64>,
    files_processed: usize,
    cache_hits: u64,
    snapshot: PerfSnapshot,
}

impl PerformanceTracker {
    /// Creates a tracker with no prior state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the persisted snapshot from `path`, or starts empty.
    ///
    /// Fail-safe: a missing file is a normal first run; an unreadable one is
    /// reported as a warning and replaced.
    pub fn load_or_default(path: &Path) -> Self {
        let snapshot = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    log::warn!("performance log unreadable ({e}), starting fresh");
                    PerfSnapshot::default()
                }
            },
            Err(_) => PerfSnapshot::default(),
        };
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Starts (or restarts) the stopwatch for `stage`.
    pub fn start(&mut self, stage: &str) {
        self.timers.insert(stage.to_string(), Instant::now());
    }

    /// Stops the stopwatch for `stage` and returns the elapsed milliseconds.
    ///
    /// Safe to call without a matching [`start`](Self::start): returns 0.0
    /// and records nothing.
    pub fn end(&mut self, stage: &str) -> f64 {
        let Some(started) = self.timers.remove(stage) else {
            return 0.0;
        };
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.record_sample(stage, duration_ms, epoch_ms());
        duration_ms
    }

    /// Records a finished stage duration against the current run's step map
    /// and the durable sample log.
    pub(crate) fn record_sample(&mut self, stage: &str, duration_ms: f64, timestamp: u64) {
        self.steps.insert(stage.to_string(), duration_ms);
        self.snapshot
            .samples
            .entry(stage.to_string())
            .or_default()
            .push(PerformanceSample {
                stage: stage.to_string(),
                duration_ms,
                timestamp,
            });
    }

    /// Appends a note to the optimization log.
    pub fn add_optimization(&mut self, kind: &str, description: &str, time_saved_ms: f64) {
        self.snapshot.optimizations.push(OptimizationNote {
            kind: kind.to_string(),
            description: description.to_string(),
            time_saved_ms,
            timestamp: epoch_ms(),
        });
    }

    /// Records how many files this run processed, for the history record.
    pub fn note_files_processed(&mut self, count: usize) {
        self.files_processed = count;
    }

    /// Records how many files the cache let this run skip.
    pub fn note_cache_hits(&mut self, count: u64) {
        self.cache_hits = count;
    }

    /// Totals the current run and folds it into the rolling history.
    pub fn get_report(&mut self) -> BuildReport {
        let total_ms: f64 = self.steps.values().sum();
        self.snapshot.history.push(BuildHistoryRecord {
            timestamp: epoch_ms(),
            duration_ms: total_ms,
            files_processed: self.files_processed,
            cache_hits: self.cache_hits,
        });
        BuildReport {
            total_ms,
            steps: self.steps.clone(),
            files_processed: self.files_processed,
            cache_hits: self.cache_hits,
            rolling_average_ms: self.snapshot.history.rolling_average_ms(),
        }
    }

    /// Per-stage trends over the recorded samples. Diagnostic only.
    pub fn trend_analysis(&self) -> Vec<StageTrend> {
        self.snapshot
            .samples
            .iter()
            .filter_map(|(stage, samples)| {
                let durations: Vec<f64> = samples.iter().map(|s| s.duration_ms).collect();
                stage_trend(stage, &durations)
            })
            .collect()
    }

    /// The rolling build history, oldest first.
    pub fn history(&self) -> &BuildHistory {
        &self.snapshot.history
    }

    /// The optimization log.
    pub fn optimizations(&self) -> &[OptimizationNote] {
        &self.snapshot.optimizations
    }

    /// Writes the snapshot to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<(), PerfError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PerfError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json =
            serde_json::to_string_pretty(&self.snapshot).map_err(|e| PerfError::Serialization {
                reason: e.to_string(),
            })?;
        std::fs::write(path, json).map_err(|e| PerfError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Milliseconds since the Unix epoch.
fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
