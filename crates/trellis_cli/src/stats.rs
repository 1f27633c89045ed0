//! The `trellis stats` command: cache statistics.

use trellis_cache::BuildCache;

use crate::{pipeline, GlobalArgs};

/// Prints statistics from the persisted cache document.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = pipeline::resolve_project_root(global)?;
    let config = trellis_config::load_or_default(&root);
    let cache_dir = root.join(&config.paths.cache_dir);

    let cache = BuildCache::load_or_create(&cache_dir, &config.build);
    let stats = cache.stats();
    let total_builds: u64 = cache
        .document()
        .files
        .values()
        .map(|entry| u64::from(entry.build_count))
        .sum();

    println!("tracked files:     {}", stats.disk_cache_size);
    println!("dependency edges:  {}", stats.dependency_count);
    println!("recorded rebuilds: {total_builds}");
    Ok(0)
}
