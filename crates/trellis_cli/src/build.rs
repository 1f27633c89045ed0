//! The `trellis build` command: incremental copy of theme sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use trellis_batch::{FileOutcome, FileProcessor};
use trellis_cache::BuildCache;
use trellis_perf::PerformanceTracker;

use crate::{analyze, pipeline, BuildArgs, GlobalArgs};

/// File name of the performance snapshot inside the cache directory.
const PERFORMANCE_FILE: &str = "performance.json";

/// Runs an incremental build: discover sources, decide per file whether the
/// copy can be skipped, fan out the remaining copies, and persist cache and
/// performance state.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = pipeline::resolve_project_root(global)?;
    let mut config = trellis_config::load_or_default(&root);
    if args.no_cache {
        config.build.enable_cache = false;
    }
    if args.no_parallel {
        config.build.enable_parallel = false;
    }

    let source_root = root.join(args.source.as_ref().unwrap_or(&config.paths.source_dir));
    let build_root = root.join(args.out.as_ref().unwrap_or(&config.paths.build_dir));
    let cache_dir = root.join(&config.paths.cache_dir);
    let perf_path = cache_dir.join(PERFORMANCE_FILE);

    let cache = Arc::new(Mutex::new(BuildCache::load_or_create(
        &cache_dir,
        &config.build,
    )));
    let tracker = Arc::new(Mutex::new(PerformanceTracker::load_or_default(&perf_path)));
    register_flush_on_interrupt(&cache, &tracker, &perf_path);

    tracker.lock().unwrap().start("scan");
    let files = pipeline::discover_theme_files(&source_root)?;
    tracker.lock().unwrap().end("scan");

    tracker.lock().unwrap().start("detect");
    let (changed, destinations) = detect_changes(&cache, &files, &source_root, &build_root);
    tracker.lock().unwrap().end("detect");

    tracker.lock().unwrap().start("copy");
    let processor = FileProcessor::new(config.build.enable_parallel, config.build.chunk_size);
    let operation = |path: &Path| copy_to_destination(path, &destinations);
    let progress = |done: usize, total: usize| log::debug!("copied {done}/{total} files");
    let outcomes = processor.process_files(&changed, operation, Some(&progress));
    let copy_ms = tracker.lock().unwrap().end("copy");

    let failures: Vec<&FileOutcome<u64>> = outcomes.iter().filter(|o| !o.success()).collect();
    for failure in &failures {
        if let Err(message) = &failure.result {
            log::warn!("copy failed for {}: {message}", failure.path.display());
        }
    }

    let stats = cache.lock().unwrap().stats();
    let report = {
        let mut tracker = tracker.lock().unwrap();
        tracker.note_files_processed(changed.len());
        tracker.note_cache_hits(stats.hits);
        if stats.hits > 0 && !changed.is_empty() {
            let saved_ms = copy_ms / changed.len() as f64 * stats.hits as f64;
            tracker.add_optimization(
                "cache-skip",
                &format!("skipped {} unchanged files", stats.hits),
                saved_ms,
            );
        }
        let report = tracker.get_report();
        if let Err(e) = tracker.save(&perf_path) {
            log::warn!("could not save performance log: {e}");
        }
        report
    };

    if let Err(e) = cache.lock().unwrap().save() {
        log::warn!("could not save cache: {e}");
    }

    if !global.quiet {
        println!(
            "{} files scanned, {} copied, {} skipped",
            files.len(),
            changed.len(),
            files.len() - changed.len()
        );
        println!(
            "cache: {:.0}% hit rate, {} tracked files, {} dependency edges",
            stats.hit_rate() * 100.0,
            stats.disk_cache_size,
            stats.dependency_count
        );
        println!(
            "build finished in {:.0} ms (rolling average {:.0} ms)",
            report.total_ms, report.rolling_average_ms
        );
        if !failures.is_empty() {
            println!("{} files failed to copy", failures.len());
        }
    }

    Ok(if failures.is_empty() { 0 } else { 1 })
}

/// Records liquid dependency edges, then collects the files whose copy cannot
/// be skipped along with their destinations.
fn detect_changes(
    cache: &Arc<Mutex<BuildCache>>,
    files: &[PathBuf],
    source_root: &Path,
    build_root: &Path,
) -> (Vec<PathBuf>, HashMap<PathBuf, PathBuf>) {
    let mut cache = cache.lock().unwrap();

    // Dependency edges first, so this run's verdicts already see them.
    let snippets = pipeline::snippet_index(files);
    for file in files {
        if file.extension().and_then(|e| e.to_str()) != Some("liquid") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        for target in analyze::render_targets(&content) {
            if let Some(dependency) = snippets.get(&target) {
                cache.add_dependency(file, dependency);
            }
        }
    }

    let mut changed = Vec::new();
    let mut destinations = HashMap::new();
    for file in files {
        let dest = pipeline::destination(build_root, source_root, file);
        if cache.has_changed(file, Some(&dest), true) {
            destinations.insert(file.clone(), dest);
            changed.push(file.clone());
        }
    }
    (changed, destinations)
}

/// The per-file copy operation handed to the processor.
fn copy_to_destination(path: &Path, destinations: &HashMap<PathBuf, PathBuf>) -> Result<u64, String> {
    let dest = destinations
        .get(path)
        .ok_or_else(|| format!("no destination mapped for {}", path.display()))?;
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::copy(path, dest).map_err(|e| e.to_string())
}

/// Flushes cache and performance state when the process is interrupted.
///
/// There is no graceful cancellation of in-flight work; the handler persists
/// what is known and exits. Registration failure (e.g. a second handler in
/// the same process) is not fatal.
fn register_flush_on_interrupt(
    cache: &Arc<Mutex<BuildCache>>,
    tracker: &Arc<Mutex<PerformanceTracker>>,
    perf_path: &Path,
) {
    let cache = Arc::clone(cache);
    let tracker = Arc::clone(tracker);
    let perf_path = perf_path.to_path_buf();
    let result = ctrlc::set_handler(move || {
        log::warn!("interrupted, flushing cache state");
        if let Ok(mut cache) = cache.lock() {
            if let Err(e) = cache.save() {
                log::warn!("could not save cache: {e}");
            }
        }
        if let Ok(tracker) = tracker.lock() {
            if let Err(e) = tracker.save(&perf_path) {
                log::warn!("could not save performance log: {e}");
            }
        }
        std::process::exit(130);
    });
    if let Err(e) = result {
        log::debug!("signal handler not installed: {e}");
    }
}
