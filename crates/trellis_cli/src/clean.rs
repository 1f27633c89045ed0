//! The `trellis clean` command: drop the cache directory.

use crate::{pipeline, GlobalArgs};

/// Deletes the cache directory. A missing directory is already clean.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = pipeline::resolve_project_root(global)?;
    let config = trellis_config::load_or_default(&root);
    let cache_dir = root.join(&config.paths.cache_dir);

    match std::fs::remove_dir_all(&cache_dir) {
        Ok(()) => {
            if !global.quiet {
                println!("removed {}", cache_dir.display());
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if !global.quiet {
                println!("nothing to clean");
            }
        }
        Err(e) => return Err(e.into()),
    }
    Ok(0)
}
