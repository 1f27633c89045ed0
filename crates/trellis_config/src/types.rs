//! Configuration types deserialized from `trellis.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// Default memory budget for the in-process cache tier: 50 MiB.
const DEFAULT_MEMORY_BUDGET: u64 = 50 * 1024 * 1024;

/// Default number of files per chunk on the chunked processing path.
const DEFAULT_CHUNK_SIZE: usize = 50;

/// The top-level build configuration parsed from `trellis.toml`.
///
/// Every field has an explicit default, so an empty (or absent) configuration
/// file yields a fully usable config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildConfig {
    /// Cache and processing behavior.
    #[serde(default)]
    pub build: BuildSettings,
    /// Source, output, and cache directory locations.
    #[serde(default)]
    pub paths: ProjectPaths,
}

/// Cache and processing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSettings {
    /// Master switch for the build cache. When off, every file is treated
    /// as changed.
    #[serde(default = "default_true")]
    pub enable_cache: bool,

    /// Whether large file sets may be processed on the chunked worker-pool path.
    #[serde(default = "default_true")]
    pub enable_parallel: bool,

    /// Number of files per chunk on the chunked path.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// How file fingerprints are computed.
    #[serde(default)]
    pub cache_strategy: CacheStrategy,

    /// Whether a file's direct dependencies are consulted when deciding if
    /// it changed.
    #[serde(default = "default_true")]
    pub dependency_tracking: bool,

    /// Whether a changed file invalidates the cached verdicts of files that
    /// depend on it.
    #[serde(default = "default_true")]
    pub smart_invalidation: bool,

    /// Byte budget for the in-process memory cache tier.
    #[serde(default = "default_memory_budget")]
    pub max_memory_cache_size: u64,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            enable_cache: true,
            enable_parallel: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cache_strategy: CacheStrategy::default(),
            dependency_tracking: true,
            smart_invalidation: true,
            max_memory_cache_size: DEFAULT_MEMORY_BUDGET,
        }
    }
}

/// How file fingerprints are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum CacheStrategy {
    /// Hash the full file content (default). Immune to touch-without-edit.
    #[default]
    #[serde(rename = "content-based")]
    ContentBased,
    /// Hash only mtime and size. Cheaper, but a touch forces a rebuild.
    #[serde(rename = "timestamp-based")]
    TimestampBased,
}

/// Source, output, and cache directory locations, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectPaths {
    /// Directory holding theme sources.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Directory the built theme is assembled into.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Directory holding the cache document and performance snapshot.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for ProjectPaths {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            build_dir: default_build_dir(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_memory_budget() -> u64 {
    DEFAULT_MEMORY_BUDGET
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("theme")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".trellis-cache")
}
