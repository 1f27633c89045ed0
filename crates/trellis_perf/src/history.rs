//! Rolling build history and per-stage trend analysis.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How many past builds the rolling history keeps.
const HISTORY_CAP: usize = 50;

/// How many recent samples form the "recent" window of a trend.
const TREND_WINDOW: usize = 5;

/// One completed build in the rolling history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildHistoryRecord {
    /// When the build finished (epoch milliseconds).
    pub timestamp: u64,
    /// Total duration across all stages.
    pub duration_ms: f64,
    /// How many files were processed.
    pub files_processed: usize,
    /// How many files the cache let the build skip.
    pub cache_hits: u64,
}

/// FIFO-capped log of the most recent builds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildHistory {
    records: VecDeque<BuildHistoryRecord>,
}

impl BuildHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record, evicting the oldest past the cap.
    pub fn push(&mut self, record: BuildHistoryRecord) {
        self.records.push_back(record);
        while self.records.len() > HISTORY_CAP {
            self.records.pop_front();
        }
    }

    /// The records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &BuildHistoryRecord> {
        self.records.iter()
    }

    /// Number of retained builds.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no builds have been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean total duration across the retained builds.
    pub fn rolling_average_ms(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.records.iter().map(|r| r.duration_ms).sum();
        sum / self.records.len() as f64
    }
}

/// Direction of a stage's duration over recent builds.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTrend {
    /// The stage name.
    pub stage: String,
    /// Mean duration of the most recent samples.
    pub recent_mean_ms: f64,
    /// Mean duration of all older samples.
    pub baseline_mean_ms: f64,
    /// Positive when the stage got faster, as a percentage of the baseline.
    pub improvement_percent: f64,
}

/// Computes the trend for one stage's chronological durations.
///
/// The most recent [`TREND_WINDOW`] samples are compared against the mean of
/// everything older. Returns `None` when there is no older baseline to
/// compare against.
pub fn stage_trend(stage: &str, durations_ms: &[f64]) -> Option<StageTrend> {
    if durations_ms.len() <= TREND_WINDOW {
        return None;
    }
    let split = durations_ms.len() - TREND_WINDOW;
    let (older, recent) = durations_ms.split_at(split);

    let baseline_mean_ms = older.iter().sum::<f64>() / older.len() as f64;
    let recent_mean_ms = recent.iter().sum::<f64>() / recent.len() as f64;
    let improvement_percent = if baseline_mean_ms == 0.0 {
        0.0
    } else {
        (baseline_mean_ms - recent_mean_ms) / baseline_mean_ms * 100.0
    };

    Some(StageTrend {
        stage: stage.to_string(),
        recent_mean_ms,
        baseline_mean_ms,
        improvement_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(duration_ms: f64) -> BuildHistoryRecord {
        BuildHistoryRecord {
            timestamp: 1_700_000_000_000,
            duration_ms,
            files_processed: 10,
            cache_hits: 5,
        }
    }

    #[test]
    fn push_and_len() {
        let mut history = BuildHistory::new();
        assert!(history.is_empty());
        history.push(record(100.0));
        history.push(record(200.0));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn cap_evicts_oldest_fifo() {
        let mut history = BuildHistory::new();
        for i in 0..55 {
            history.push(record(i as f64));
        }
        assert_eq!(history.len(), 50);
        // Records 0..5 were evicted; the oldest retained is build #5.
        assert_eq!(history.records().next().unwrap().duration_ms, 5.0);
    }

    #[test]
    fn rolling_average() {
        let mut history = BuildHistory::new();
        history.push(record(100.0));
        history.push(record(300.0));
        assert!((history.rolling_average_ms() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rolling_average_empty_is_zero() {
        assert_eq!(BuildHistory::new().rolling_average_ms(), 0.0);
    }

    #[test]
    fn trend_improvement() {
        // Baseline of 100ms, recent window of 50ms: 50% improvement.
        let durations = [100.0, 100.0, 100.0, 50.0, 50.0, 50.0, 50.0, 50.0];
        let trend = stage_trend("styles", &durations).unwrap();
        assert_eq!(trend.stage, "styles");
        assert!((trend.baseline_mean_ms - 100.0).abs() < f64::EPSILON);
        assert!((trend.recent_mean_ms - 50.0).abs() < f64::EPSILON);
        assert!((trend.improvement_percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trend_regression_is_negative() {
        let durations = [50.0, 50.0, 50.0, 100.0, 100.0, 100.0, 100.0, 100.0];
        let trend = stage_trend("copy", &durations).unwrap();
        assert!((trend.improvement_percent + 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trend_needs_baseline() {
        // Five samples or fewer: everything would be "recent", no baseline.
        assert!(stage_trend("copy", &[1.0, 2.0, 3.0, 4.0, 5.0]).is_none());
        assert!(stage_trend("copy", &[]).is_none());
    }

    #[test]
    fn trend_zero_baseline() {
        let durations = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0];
        let trend = stage_trend("scan", &durations).unwrap();
        assert_eq!(trend.improvement_percent, 0.0);
    }

    #[test]
    fn history_serde_roundtrip() {
        let mut history = BuildHistory::new();
        history.push(record(123.0));
        let json = serde_json::to_string(&history).unwrap();
        let back: BuildHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.records().next().unwrap().duration_ms, 123.0);
    }
}
