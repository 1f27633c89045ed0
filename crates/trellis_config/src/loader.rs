//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::BuildConfig;
use std::path::Path;

/// Smallest accepted memory budget for the cache tier.
const MIN_MEMORY_BUDGET: u64 = 1024;

/// Loads and validates a `trellis.toml` configuration from a project directory.
///
/// Reads `<project_dir>/trellis.toml`, parses it, and validates the values.
pub fn load_config(project_dir: &Path) -> Result<BuildConfig, ConfigError> {
    let config_path = project_dir.join("trellis.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `trellis.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<BuildConfig, ConfigError> {
    let config: BuildConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Loads the configuration, falling back to defaults on any failure.
///
/// A missing file is expected and silent; an unreadable or invalid file is
/// reported as a warning. Startup never fails on configuration problems.
pub fn load_or_default(project_dir: &Path) -> BuildConfig {
    if !project_dir.join("trellis.toml").exists() {
        return BuildConfig::default();
    }
    match load_config(project_dir) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring trellis.toml: {e}");
            BuildConfig::default()
        }
    }
}

/// Validates that configuration values are usable.
fn validate_config(config: &BuildConfig) -> Result<(), ConfigError> {
    if config.build.chunk_size < 1 {
        return Err(ConfigError::ValidationError(
            "build.chunk_size must be at least 1".to_string(),
        ));
    }
    if config.build.max_memory_cache_size < MIN_MEMORY_BUDGET {
        return Err(ConfigError::ValidationError(format!(
            "build.max_memory_cache_size must be at least {MIN_MEMORY_BUDGET} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CacheStrategy;
    use std::fs;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert!(config.build.enable_cache);
        assert_eq!(config.build.chunk_size, 50);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[build]
enable_cache = true
enable_parallel = false
chunk_size = 25
cache_strategy = "timestamp-based"
dependency_tracking = false
smart_invalidation = false
max_memory_cache_size = 1048576

[paths]
source_dir = "theme-src"
build_dir = "dist"
cache_dir = ".cache"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(!config.build.enable_parallel);
        assert_eq!(config.build.chunk_size, 25);
        assert_eq!(config.build.cache_strategy, CacheStrategy::TimestampBased);
        assert!(!config.build.dependency_tracking);
        assert!(!config.build.smart_invalidation);
        assert_eq!(config.build.max_memory_cache_size, 1_048_576);
        assert_eq!(config.paths.source_dir.to_str(), Some("theme-src"));
        assert_eq!(config.paths.build_dir.to_str(), Some("dist"));
        assert_eq!(config.paths.cache_dir.to_str(), Some(".cache"));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let err = load_config_from_str("[build]\nchunk_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn tiny_memory_budget_rejected() {
        let err = load_config_from_str("[build]\nmax_memory_cache_size = 100\n").unwrap_err();
        assert!(err.to_string().contains("max_memory_cache_size"));
    }

    #[test]
    fn invalid_toml_rejected() {
        let err = load_config_from_str("not valid toml {{{").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trellis.toml"), "[build]\nchunk_size = 10\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.build.chunk_size, 10);
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(dir.path());
        assert!(config.build.enable_cache);
    }

    #[test]
    fn load_or_default_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("trellis.toml"), "{{{ nope").unwrap();
        let config = load_or_default(dir.path());
        assert_eq!(config.build.chunk_size, 50);
    }
}
