//! The expiring in-process memory tier over the durable cache document.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a cached verdict stays valid.
const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Fixed per-entry overhead added to the size estimate: map slot, verdict,
/// timestamps, and the fingerprint recorded alongside the entry on disk.
const ENTRY_OVERHEAD: usize = 64;

/// A cached changed/unchanged verdict for one file.
#[derive(Debug)]
struct MemoryEntry {
    changed: bool,
    stamp: Instant,
    last_access: Instant,
    size_estimate: usize,
}

/// Bounded, expiring verdict cache.
///
/// Entries expire a fixed window after insertion. The aggregate size estimate
/// is kept under the configured byte budget by a batch eviction pass: when a
/// write pushes the total over budget, the oldest 25% of entries (by last
/// access) are dropped in one sweep rather than evicting one-by-one under
/// sustained pressure.
#[derive(Debug)]
pub(crate) struct MemoryTier {
    entries: HashMap<String, MemoryEntry>,
    total_size: usize,
    budget: usize,
    freshness: Duration,
}

impl MemoryTier {
    /// Creates a tier with the given byte budget and the standard freshness
    /// window.
    pub(crate) fn new(budget: usize) -> Self {
        Self::with_freshness(budget, FRESHNESS_WINDOW)
    }

    /// Creates a tier with an explicit freshness window. Test hook.
    pub(crate) fn with_freshness(budget: usize, freshness: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            total_size: 0,
            budget,
            freshness,
        }
    }

    /// Returns the cached verdict for `key` if a fresh entry exists.
    ///
    /// A stale entry is dropped on the way through. A hit refreshes the
    /// entry's last-access time for eviction ordering.
    pub(crate) fn lookup(&mut self, key: &str) -> Option<bool> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.stamp.elapsed() >= self.freshness,
            None => return None,
        };
        if expired {
            self.remove(key);
            return None;
        }
        let entry = self.entries.get_mut(key)?;
        entry.last_access = Instant::now();
        Some(entry.changed)
    }

    /// Records a verdict for `key`, replacing any previous entry.
    ///
    /// Runs an eviction pass if the write pushes the total over budget.
    pub(crate) fn insert(&mut self, key: String, changed: bool) {
        let size_estimate = key.len() + ENTRY_OVERHEAD;
        if let Some(old) = self.entries.remove(&key) {
            self.total_size -= old.size_estimate;
        }
        let now = Instant::now();
        self.entries.insert(
            key,
            MemoryEntry {
                changed,
                stamp: now,
                last_access: now,
                size_estimate,
            },
        );
        self.total_size += size_estimate;
        if self.total_size > self.budget {
            self.evict_oldest();
        }
    }

    /// Drops the entry for `key`, if present.
    pub(crate) fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.total_size -= entry.size_estimate;
        }
    }

    /// Single batch eviction pass: the oldest quarter of entries by last
    /// access (at least one) are removed.
    fn evict_oldest(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.last_access))
            .collect();
        by_age.sort_by_key(|(_, last_access)| *last_access);

        let count = (by_age.len() + 3) / 4;
        for (key, _) in by_age.into_iter().take(count) {
            self.remove(&key);
        }
        log::debug!(
            "memory tier eviction: {count} entries dropped, {} bytes tracked",
            self.total_size
        );
    }

    /// Current aggregate size estimate in bytes.
    pub(crate) fn usage(&self) -> usize {
        self.total_size
    }

    /// Number of live entries.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
