//! File fingerprinting under the configured cache strategy.

use std::path::Path;
use std::time::UNIX_EPOCH;

use trellis_common::Fingerprint;
use trellis_config::CacheStrategy;

/// Computes fingerprints for source files.
///
/// Under the content-based strategy the digest covers the full file content;
/// under the timestamp-based strategy it covers only mtime and size. Either
/// way the result is deterministic for an unchanged file. A file that cannot
/// be stat'd or read yields `None`, which callers must treat as "definitely
/// changed" — never as "unchanged".
#[derive(Debug, Clone, Copy)]
pub struct Fingerprinter {
    strategy: CacheStrategy,
}

impl Fingerprinter {
    /// Creates a fingerprinter for the given strategy.
    pub fn new(strategy: CacheStrategy) -> Self {
        Self { strategy }
    }

    /// Computes the fingerprint of the file at `path`.
    ///
    /// Returns `None` for missing, unreadable, or non-regular files.
    pub fn fingerprint(&self, path: &Path) -> Option<Fingerprint> {
        match self.strategy {
            CacheStrategy::ContentBased => {
                let content = std::fs::read(path).ok()?;
                Some(Fingerprint::from_bytes(&content))
            }
            CacheStrategy::TimestampBased => {
                let metadata = std::fs::metadata(path).ok()?;
                if !metadata.is_file() {
                    return None;
                }
                let mtime_ms = metadata
                    .modified()
                    .ok()?
                    .duration_since(UNIX_EPOCH)
                    .ok()?
                    .as_millis() as u64;
                Some(Fingerprint::from_metadata(mtime_ms, metadata.len()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.css");
        std::fs::write(&path, "body { margin: 0 }").unwrap();

        let fp = Fingerprinter::new(CacheStrategy::ContentBased);
        assert_eq!(fp.fingerprint(&path), fp.fingerprint(&path));
    }

    #[test]
    fn content_edit_changes_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.css");
        std::fs::write(&path, "body { margin: 0 }").unwrap();

        let fp = Fingerprinter::new(CacheStrategy::ContentBased);
        let before = fp.fingerprint(&path).unwrap();
        // Same length, different bytes: the content digest must still move.
        std::fs::write(&path, "body { margin: 1 }").unwrap();
        let after = fp.fingerprint(&path).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn missing_file_is_none() {
        let fp = Fingerprinter::new(CacheStrategy::ContentBased);
        assert!(fp.fingerprint(Path::new("/nonexistent/nothing.css")).is_none());
    }

    #[test]
    fn timestamp_missing_file_is_none() {
        let fp = Fingerprinter::new(CacheStrategy::TimestampBased);
        assert!(fp.fingerprint(Path::new("/nonexistent/nothing.css")).is_none());
    }

    #[test]
    fn timestamp_directory_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let fp = Fingerprinter::new(CacheStrategy::TimestampBased);
        assert!(fp.fingerprint(dir.path()).is_none());
    }

    #[test]
    fn timestamp_size_change_changes_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        std::fs::write(&path, "let a = 1;").unwrap();

        let fp = Fingerprinter::new(CacheStrategy::TimestampBased);
        let before = fp.fingerprint(&path).unwrap();
        std::fs::write(&path, "let a = 1;;").unwrap();
        let after = fp.fingerprint(&path).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn strategies_differ_on_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.css");
        std::fs::write(&path, "x").unwrap();

        let content = Fingerprinter::new(CacheStrategy::ContentBased)
            .fingerprint(&path)
            .unwrap();
        let stamp = Fingerprinter::new(CacheStrategy::TimestampBased)
            .fingerprint(&path)
            .unwrap();
        assert_ne!(content, stamp);
    }
}
