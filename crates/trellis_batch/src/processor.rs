//! The file processor: routing, chunk fan-out, micro-batches, fallback.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::error::BatchError;
use crate::outcome::FileOutcome;

/// File sets smaller than this always take the micro-batch path.
const CHUNKED_THRESHOLD: usize = 20;

/// Files per micro-batch on the ordered path.
const MICRO_BATCH_SIZE: usize = 10;

/// Micro-batches between explicit scheduler yields.
const YIELD_INTERVAL: usize = 5;

/// Applies an operation to a list of files with failure isolation.
///
/// Small sets, or any set when the pool is disabled, run in strictly ordered
/// micro-batches. Larger sets are partitioned into chunks and processed
/// concurrently on a bounded worker pool; if that fan-out cannot run, the
/// whole set is retried on the micro-batch path so the caller always gets one
/// outcome per input file.
#[derive(Debug, Clone)]
pub struct FileProcessor {
    parallel: bool,
    chunk_size: usize,
    workers: usize,
}

impl FileProcessor {
    /// Creates a processor.
    ///
    /// `parallel` routes large sets onto the chunked worker-pool path;
    /// `chunk_size` is the number of files per chunk there (clamped to at
    /// least 1).
    pub fn new(parallel: bool, chunk_size: usize) -> Self {
        Self {
            parallel,
            chunk_size: chunk_size.max(1),
            workers: default_workers(),
        }
    }

    /// Applies `operation` to every file, reporting progress as work lands.
    ///
    /// Returns exactly one [`FileOutcome`] per input file. An operation error
    /// or panic is recorded in that file's outcome and never aborts the rest.
    /// Outcome order relative to the input is only guaranteed on the
    /// micro-batch path.
    pub fn process_files<T, F>(
        &self,
        files: &[PathBuf],
        operation: F,
        on_progress: Option<&(dyn Fn(usize, usize) + Sync)>,
    ) -> Vec<FileOutcome<T>>
    where
        T: Send,
        F: Fn(&Path) -> Result<T, String> + Sync,
    {
        if files.is_empty() {
            return Vec::new();
        }

        if !self.parallel || files.len() < CHUNKED_THRESHOLD {
            return self.process_batched(files, &operation, on_progress);
        }

        match self.process_chunked(files, &operation, on_progress) {
            Ok(outcomes) => outcomes,
            Err(err) => {
                log::warn!("{err}; retrying the full set in micro-batches");
                self.process_batched(files, &operation, on_progress)
            }
        }
    }

    /// Ordered micro-batch path.
    ///
    /// Batches are strictly sequenced; progress is reported after each batch,
    /// and every few batches the thread yields so a co-resident watcher
    /// thread gets scheduled during long runs.
    fn process_batched<T, F>(
        &self,
        files: &[PathBuf],
        operation: &F,
        on_progress: Option<&(dyn Fn(usize, usize) + Sync)>,
    ) -> Vec<FileOutcome<T>>
    where
        T: Send,
        F: Fn(&Path) -> Result<T, String> + Sync,
    {
        let total = files.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, batch) in files.chunks(MICRO_BATCH_SIZE).enumerate() {
            for path in batch {
                outcomes.push(run_isolated(operation, path));
            }
            if let Some(progress) = on_progress {
                progress(outcomes.len(), total);
            }
            if (index + 1) % YIELD_INTERVAL == 0 {
                std::thread::yield_now();
            }
        }
        outcomes
    }

    /// Chunked fan-out across the worker pool.
    ///
    /// Fails only on infrastructure problems (pool construction, a panic
    /// escaping the fan-out itself); per-file failures are already isolated
    /// inside each chunk.
    fn process_chunked<T, F>(
        &self,
        files: &[PathBuf],
        operation: &F,
        on_progress: Option<&(dyn Fn(usize, usize) + Sync)>,
    ) -> Result<Vec<FileOutcome<T>>, BatchError>
    where
        T: Send,
        F: Fn(&Path) -> Result<T, String> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| BatchError::PoolBuild {
                reason: e.to_string(),
            })?;

        let total = files.len();
        let completed = AtomicUsize::new(0);
        let chunks: Vec<&[PathBuf]> = files.chunks(self.chunk_size).collect();

        let fan_out = catch_unwind(AssertUnwindSafe(|| {
            pool.install(|| {
                chunks
                    .par_iter()
                    .map(|chunk| {
                        let outcomes: Vec<FileOutcome<T>> =
                            chunk.iter().map(|path| run_isolated(operation, path)).collect();
                        let done = completed.fetch_add(chunk.len(), Ordering::Relaxed) + chunk.len();
                        if let Some(progress) = on_progress {
                            progress(done.min(total), total);
                        }
                        outcomes
                    })
                    .collect::<Vec<_>>()
            })
        }));

        match fan_out {
            Ok(nested) => Ok(nested.into_iter().flatten().collect()),
            Err(payload) => Err(BatchError::Orchestration {
                reason: panic_message(payload),
            }),
        }
    }
}

/// Runs the operation for one file, converting errors and panics into the
/// file's outcome.
fn run_isolated<T, F>(operation: &F, path: &Path) -> FileOutcome<T>
where
    F: Fn(&Path) -> Result<T, String>,
{
    let result = match catch_unwind(AssertUnwindSafe(|| operation(path))) {
        Ok(result) => result,
        Err(payload) => Err(panic_message(payload)),
    };
    FileOutcome {
        path: path.to_path_buf(),
        result,
    }
}

/// Extracts a printable message from a panic payload.
fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".to_string()
    }
}

/// Worker count for the chunked path: half the cores, between 2 and 8.
fn default_workers() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cores / 2).clamp(2, 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn files(count: usize) -> Vec<PathBuf> {
        (0..count).map(|i| PathBuf::from(format!("src/file-{i:03}.css"))).collect()
    }

    /// Succeeds with the file's index, failing for the listed indices.
    fn flaky_operation(failing: &'static [usize]) -> impl Fn(&Path) -> Result<usize, String> + Sync {
        move |path: &Path| {
            let name = path.to_string_lossy();
            let index: usize = name[name.len() - 7..name.len() - 4].parse().unwrap();
            if failing.contains(&index) {
                Err(format!("rejected {name}"))
            } else {
                Ok(index)
            }
        }
    }

    #[test]
    fn empty_input_no_outcomes() {
        let processor = FileProcessor::new(true, 50);
        let outcomes = processor.process_files(&[], |_: &Path| Ok::<_, String>(()), None);
        assert!(outcomes.is_empty());
    }

    #[test]
    fn small_set_ordered_outcomes() {
        let processor = FileProcessor::new(true, 50);
        let input = files(5);
        let outcomes =
            processor.process_files(&input, |p: &Path| Ok::<_, String>(p.to_path_buf()), None);

        assert_eq!(outcomes.len(), 5);
        for (outcome, path) in outcomes.iter().zip(&input) {
            assert_eq!(&outcome.path, path);
            assert!(outcome.success());
        }
    }

    #[test]
    fn failure_isolation_exact_counts() {
        let processor = FileProcessor::new(true, 10);
        let input = files(60);
        let outcomes = processor.process_files(&input, flaky_operation(&[3, 17, 42]), None);

        assert_eq!(outcomes.len(), 60);
        let failures: Vec<_> = outcomes.iter().filter(|o| !o.success()).collect();
        assert_eq!(failures.len(), 3);
        for failure in &failures {
            assert!(failure.result.as_ref().unwrap_err().starts_with("rejected"));
        }
    }

    #[test]
    fn failure_isolation_on_batched_path() {
        let processor = FileProcessor::new(false, 10);
        let input = files(60);
        let outcomes = processor.process_files(&input, flaky_operation(&[3, 17, 42]), None);

        assert_eq!(outcomes.len(), 60);
        assert_eq!(outcomes.iter().filter(|o| !o.success()).count(), 3);
    }

    #[test]
    fn panicking_operation_is_contained() {
        let processor = FileProcessor::new(true, 10);
        let input = files(30);
        let outcomes = processor.process_files(
            &input,
            |path: &Path| {
                if path.to_string_lossy().contains("-007") {
                    panic!("operation blew up");
                }
                Ok::<_, String>(())
            },
            None,
        );

        assert_eq!(outcomes.len(), 30);
        let failures: Vec<_> = outcomes.iter().filter(|o| !o.success()).collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0]
            .result
            .as_ref()
            .unwrap_err()
            .contains("operation blew up"));
    }

    #[test]
    fn fallback_equivalent_to_batched() {
        let processor = FileProcessor::new(true, 10);
        let input = files(60);
        let operation = flaky_operation(&[5, 25, 55]);

        let chunked = processor
            .process_chunked(&input, &operation, None)
            .expect("chunked path should run");
        let batched = processor.process_batched(&input, &operation, None);

        let mut chunked: Vec<_> = chunked.into_iter().map(|o| (o.path, o.result)).collect();
        let mut batched: Vec<_> = batched.into_iter().map(|o| (o.path, o.result)).collect();
        chunked.sort();
        batched.sort();
        assert_eq!(chunked, batched);
    }

    #[test]
    fn batched_progress_after_each_micro_batch() {
        let processor = FileProcessor::new(false, 50);
        let input = files(25);
        let calls = Mutex::new(Vec::new());
        let progress = |done: usize, total: usize| calls.lock().unwrap().push((done, total));

        processor.process_files(&input, |_: &Path| Ok::<_, String>(()), Some(&progress));

        assert_eq!(*calls.lock().unwrap(), vec![(10, 25), (20, 25), (25, 25)]);
    }

    #[test]
    fn chunked_progress_reaches_total() {
        let processor = FileProcessor::new(true, 10);
        let input = files(45);
        let calls = Mutex::new(Vec::new());
        let progress = |done: usize, total: usize| calls.lock().unwrap().push((done, total));

        processor.process_files(&input, |_: &Path| Ok::<_, String>(()), Some(&progress));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 5, "one report per chunk");
        assert!(calls.iter().all(|(done, total)| done <= total && *total == 45));
        assert!(calls.iter().any(|(done, _)| *done == 45));
    }

    #[test]
    fn below_threshold_uses_batched_path() {
        // 19 files stay on the micro-batch path even with the pool enabled:
        // progress arrives per micro-batch, not per chunk.
        let processor = FileProcessor::new(true, 50);
        let input = files(19);
        let calls = Mutex::new(Vec::new());
        let progress = |done: usize, total: usize| calls.lock().unwrap().push((done, total));

        processor.process_files(&input, |_: &Path| Ok::<_, String>(()), Some(&progress));

        assert_eq!(*calls.lock().unwrap(), vec![(10, 19), (19, 19)]);
    }

    #[test]
    fn chunk_size_clamped_to_one() {
        let processor = FileProcessor::new(true, 0);
        let input = files(25);
        let outcomes = processor.process_files(&input, |_: &Path| Ok::<_, String>(()), None);
        assert_eq!(outcomes.len(), 25);
    }
}
