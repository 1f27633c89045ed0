//! File fingerprints for cache invalidation and incremental rebuilds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit fingerprint computed using XXH3 for cache invalidation.
///
/// Two files with the same `Fingerprint` are assumed to be in the same state.
/// Depending on the configured cache strategy the digest covers either the
/// full file content or only its metadata (mtime + size).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Computes a fingerprint from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Computes a fingerprint from file metadata (mtime in ms, size in bytes).
    ///
    /// Used by the timestamp-based strategy, which avoids reading file content.
    pub fn from_metadata(mtime_ms: u64, len: u64) -> Self {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&mtime_ms.to_le_bytes());
        buf[8..].copy_from_slice(&len.to_le_bytes());
        Self::from_bytes(&buf)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}
