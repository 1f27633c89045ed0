//! High-level cache orchestrator.
//!
//! [`BuildCache`] ties the fingerprinter, the durable cache document, the
//! dependency graph, and the memory tier into a single changed/unchanged
//! verdict per file. It is constructed once at process start and passed by
//! reference to every consumer; there is no global instance.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use trellis_common::normalize_key;
use trellis_config::BuildSettings;

use crate::document::{CacheDocument, CacheEntry};
use crate::error::CacheError;
use crate::fingerprint::Fingerprinter;
use crate::graph::DependencyGraph;
use crate::memory::MemoryTier;

/// Minimum interval between housekeeping passes.
const HOUSEKEEPING_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

/// Entries untouched for this long are pruned during housekeeping.
const STALE_ENTRY_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Counters and gauges describing cache effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Verdicts of "unchanged" (work skipped).
    pub hits: u64,
    /// Verdicts of "changed" (work required).
    pub misses: u64,
    /// Fast-path verdicts served from the memory tier.
    pub memory_hits: u64,
    /// Current memory tier size estimate in bytes.
    pub memory_usage: usize,
    /// Number of files tracked in the durable document.
    pub disk_cache_size: usize,
    /// Number of dependency edges currently known.
    pub dependency_count: usize,
}

impl CacheStats {
    /// Fraction of verdicts that skipped work, in `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Two-tier incremental build cache with dependency invalidation.
pub struct BuildCache {
    cache_dir: PathBuf,
    settings: BuildSettings,
    fingerprinter: Fingerprinter,
    document: CacheDocument,
    graph: DependencyGraph,
    memory: MemoryTier,
    hits: u64,
    misses: u64,
    memory_hits: u64,
}

impl BuildCache {
    /// Loads the cache from `cache_dir`, or starts cold.
    ///
    /// A missing document is a normal first run. An unreadable or
    /// version-mismatched document is reported as a warning and replaced with
    /// an empty one; startup never fails on cache problems.
    pub fn load_or_create(cache_dir: &Path, settings: &BuildSettings) -> Self {
        let document = match CacheDocument::load(cache_dir) {
            Some(doc) if doc.is_compatible() => doc,
            Some(_) => {
                log::warn!("cache document has an unsupported version, starting fresh");
                CacheDocument::new(epoch_ms())
            }
            None => {
                if CacheDocument::exists(cache_dir) {
                    log::warn!("cache document is unreadable, starting fresh");
                }
                CacheDocument::new(epoch_ms())
            }
        };

        let graph = DependencyGraph::from_document(&document.dependencies);
        let memory = MemoryTier::new(settings.max_memory_cache_size as usize);

        Self {
            cache_dir: cache_dir.to_path_buf(),
            settings: settings.clone(),
            fingerprinter: Fingerprinter::new(settings.cache_strategy),
            document,
            graph,
            memory,
            hits: 0,
            misses: 0,
            memory_hits: 0,
        }
    }

    /// Decides whether `path` needs to be rebuilt.
    ///
    /// `dest` is the build output for this source, when the caller knows it:
    /// a missing output forces a rebuild even if the source is unchanged
    /// (self-healing). `check_dependencies` enables the one-level lookahead
    /// into the file's direct dependencies; the lookahead itself always runs
    /// with dependencies off, so chains are never followed transitively.
    ///
    /// A verdict of "changed" records the file's new fingerprint, so the next
    /// cycle sees it as unchanged. An unreadable file is always changed.
    pub fn has_changed(&mut self, path: &Path, dest: Option<&Path>, check_dependencies: bool) -> bool {
        if !self.settings.enable_cache {
            return true;
        }

        let key = normalize_key(path);
        if let Some(verdict) = self.memory.lookup(&key) {
            self.memory_hits += 1;
            return verdict;
        }

        let current = self.fingerprinter.fingerprint(path);
        let dest_missing = dest.map(|d| !d.exists()).unwrap_or(false);

        let mut changed = match (&current, self.document.files.get(&key)) {
            (Some(hash), Some(entry)) if !dest_missing => entry.hash != *hash,
            _ => true,
        };

        if !changed && self.settings.dependency_tracking && check_dependencies {
            let deps: Vec<String> = self
                .graph
                .dependencies_of(&key)
                .map(|deps| deps.iter().cloned().collect())
                .unwrap_or_default();
            for dep in deps {
                if self.has_changed(Path::new(&dep), None, false) {
                    changed = true;
                    break;
                }
            }
        }

        if changed {
            self.misses += 1;
            self.record(&key, current);
            self.memory.insert(key.clone(), true);
            if self.settings.smart_invalidation {
                for dependent in self.graph.dependents_of(&key) {
                    self.memory.remove(&dependent);
                }
            }
        } else {
            self.hits += 1;
            self.memory.insert(key, false);
        }
        changed
    }

    /// Writes the new fingerprint into the durable document.
    fn record(&mut self, key: &str, current: Option<trellis_common::Fingerprint>) {
        let Some(hash) = current else {
            // Nothing to record for an unreadable file; it stays "changed"
            // until it can be fingerprinted again.
            return;
        };
        let now = epoch_ms();
        let entry = self
            .document
            .files
            .entry(key.to_string())
            .or_insert(CacheEntry {
                hash,
                last_modified: now,
                build_count: 0,
            });
        entry.hash = hash;
        entry.last_modified = now;
        entry.build_count += 1;
    }

    /// Records that `path` directly depends on `dependency`.
    ///
    /// The edge takes effect immediately for this run's cascades and is
    /// persisted with the next [`save`](Self::save).
    pub fn add_dependency(&mut self, path: &Path, dependency: &Path) {
        self.graph
            .add_dependency(&normalize_key(path), &normalize_key(dependency));
    }

    /// Persists the cache document, running housekeeping first when due.
    ///
    /// Housekeeping is amortized: at most once per 24 hours, entries for
    /// files that no longer exist or that have not been touched in 7 days are
    /// pruned along with their dependency edges.
    pub fn save(&mut self) -> Result<(), CacheError> {
        self.housekeep();
        self.document.dependencies = self.graph.to_document();
        self.document.save(&self.cache_dir)
    }

    fn housekeep(&mut self) {
        let now = epoch_ms();
        if now.saturating_sub(self.document.last_cleanup) < HOUSEKEEPING_INTERVAL_MS {
            return;
        }

        let stale: Vec<String> = self
            .document
            .files
            .iter()
            .filter(|(key, entry)| {
                !Path::new(key).exists()
                    || now.saturating_sub(entry.last_modified) > STALE_ENTRY_MS
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            self.document.files.remove(key);
            self.graph.remove_path(key);
            self.memory.remove(key);
        }
        if !stale.is_empty() {
            log::debug!("housekeeping pruned {} stale cache entries", stale.len());
        }
        self.document.last_cleanup = now;
    }

    /// Current cache effectiveness statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            memory_hits: self.memory_hits,
            memory_usage: self.memory.usage(),
            disk_cache_size: self.document.files.len(),
            dependency_count: self.graph.edge_count(),
        }
    }

    /// Read access to the durable document, for reporting.
    pub fn document(&self) -> &CacheDocument {
        &self.document
    }
}

/// Milliseconds since the Unix epoch.
fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
