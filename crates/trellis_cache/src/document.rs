//! The durable cache document spanning runs.
//!
//! One JSON document records everything the cache needs across processes:
//! per-file fingerprints, the dependency adjacency, and the housekeeping
//! timestamp. Keeping the adjacency in the same document as the fingerprints
//! means a single atomic write keeps them mutually consistent.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use trellis_common::Fingerprint;

use crate::error::CacheError;

/// Name of the cache document within the cache directory.
const DOCUMENT_FILE: &str = "cache.json";

/// Current document format version. Increment on breaking layout changes;
/// a mismatched version is treated as no cache at all.
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Durable cache state, serialized as `cache.json` in the cache directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheDocument {
    /// Document format version.
    pub version: u32,

    /// Per-file cache state, keyed by normalized path.
    pub files: BTreeMap<String, CacheEntry>,

    /// Direct dependency lists, keyed by normalized path of the dependent file.
    pub dependencies: BTreeMap<String, Vec<String>>,

    /// When the last housekeeping pass ran (epoch milliseconds).
    pub last_cleanup: u64,
}

/// Durable cache state for a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The last fingerprint recorded for this file.
    pub hash: Fingerprint,

    /// When the fingerprint was recorded (epoch milliseconds).
    pub last_modified: u64,

    /// How many times this file has been observed as changed.
    pub build_count: u32,
}

impl CacheDocument {
    /// Creates a new, empty cache document.
    ///
    /// `last_cleanup` starts at `now` so a brand-new cache does not run a
    /// pointless housekeeping pass on its first save.
    pub fn new(now: u64) -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            files: BTreeMap::new(),
            dependencies: BTreeMap::new(),
            last_cleanup: now,
        }
    }

    /// Loads the document from the cache directory, returning `None` if the
    /// file doesn't exist or can't be parsed.
    ///
    /// This is fail-safe: any error results in `None` (a cold cache),
    /// triggering a full rebuild rather than a startup failure.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let path = cache_dir.join(DOCUMENT_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Returns `true` if this document uses the current format version.
    pub fn is_compatible(&self) -> bool {
        self.version == DOCUMENT_FORMAT_VERSION
    }

    /// Returns `true` if a cache document file exists in the directory.
    pub fn exists(cache_dir: &Path) -> bool {
        cache_dir.join(DOCUMENT_FILE).exists()
    }

    /// Saves the document atomically into the cache directory.
    ///
    /// Creates the cache directory if needed, writes to a temporary sibling
    /// file, then renames over the final path. A crash mid-save leaves the
    /// previous document intact; the worst case is one stale rebuild.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;

        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;

        let path = cache_dir.join(DOCUMENT_FILE);
        let tmp = cache_dir.join(format!("{DOCUMENT_FILE}.tmp"));
        std::fs::write(&tmp, json).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io { path, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: &[u8]) -> CacheEntry {
        CacheEntry {
            hash: Fingerprint::from_bytes(content),
            last_modified: 1_700_000_000_000,
            build_count: 1,
        }
    }

    #[test]
    fn new_document_is_empty() {
        let doc = CacheDocument::new(42);
        assert_eq!(doc.version, DOCUMENT_FORMAT_VERSION);
        assert!(doc.files.is_empty());
        assert!(doc.dependencies.is_empty());
        assert_eq!(doc.last_cleanup, 42);
        assert!(doc.is_compatible());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = CacheDocument::new(0);
        doc.files.insert("src/css/main.css".to_string(), entry(b"body {}"));
        doc.dependencies.insert(
            "src/js/cart.js".to_string(),
            vec!["src/css/main.css".to_string()],
        );
        doc.save(dir.path()).unwrap();

        let loaded = CacheDocument::load(dir.path()).unwrap();
        assert_eq!(loaded.files.len(), 1);
        assert_eq!(
            loaded.files["src/css/main.css"].hash,
            Fingerprint::from_bytes(b"body {}")
        );
        assert_eq!(
            loaded.dependencies["src/js/cart.js"],
            vec!["src/css/main.css"]
        );
    }

    #[test]
    fn load_nonexistent_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CacheDocument::load(dir.path()).is_none());
        assert!(!CacheDocument::exists(dir.path()));
    }

    #[test]
    fn load_corrupt_json_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cache.json"), "not valid json {{{").unwrap();
        assert!(CacheDocument::load(dir.path()).is_none());
        assert!(CacheDocument::exists(dir.path()));
    }

    #[test]
    fn version_mismatch_detected() {
        let doc = CacheDocument {
            version: DOCUMENT_FORMAT_VERSION + 1,
            files: BTreeMap::new(),
            dependencies: BTreeMap::new(),
            last_cleanup: 0,
        };
        assert!(!doc.is_compatible());
    }

    #[test]
    fn save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deeply").join("nested").join("cache");
        CacheDocument::new(0).save(&nested).unwrap();
        assert!(nested.join("cache.json").exists());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        CacheDocument::new(0).save(dir.path()).unwrap();
        assert!(dir.path().join("cache.json").exists());
        assert!(!dir.path().join("cache.json.tmp").exists());
    }

    #[test]
    fn save_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = CacheDocument::new(0);
        doc.save(dir.path()).unwrap();
        doc.files.insert("a.css".to_string(), entry(b"a"));
        doc.save(dir.path()).unwrap();

        let loaded = CacheDocument::load(dir.path()).unwrap();
        assert_eq!(loaded.files.len(), 1);
    }
}
