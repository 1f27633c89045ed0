//! The `trellis report` command: build history and stage trends.

use trellis_perf::PerformanceTracker;

use crate::{pipeline, GlobalArgs};

/// Prints the rolling build history and per-stage trend analysis.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = pipeline::resolve_project_root(global)?;
    let config = trellis_config::load_or_default(&root);
    let perf_path = root.join(&config.paths.cache_dir).join("performance.json");

    let tracker = PerformanceTracker::load_or_default(&perf_path);
    let history = tracker.history();

    if history.is_empty() {
        println!("no builds recorded yet");
        return Ok(0);
    }

    println!("last {} builds (oldest first):", history.len());
    for record in history.records() {
        println!(
            "  {:>8.0} ms  {:>5} files  {:>5} cache hits",
            record.duration_ms, record.files_processed, record.cache_hits
        );
    }
    println!("rolling average: {:.0} ms", history.rolling_average_ms());

    let trends = tracker.trend_analysis();
    if !trends.is_empty() {
        println!("stage trends (recent vs baseline):");
        for trend in &trends {
            println!(
                "  {:<12} {:>8.1} ms vs {:>8.1} ms  ({:+.1}%)",
                trend.stage, trend.recent_mean_ms, trend.baseline_mean_ms, trend.improvement_percent
            );
        }
    }
    Ok(0)
}
