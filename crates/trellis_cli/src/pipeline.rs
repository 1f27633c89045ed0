//! Shared pipeline helpers for CLI commands.
//!
//! Project root resolution, theme source discovery, and the mapping from a
//! source file to its location in the built theme tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use trellis_common::normalize_key;

use crate::GlobalArgs;

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir →
/// itself). Otherwise walks up from the current directory looking for
/// `trellis.toml`, falling back to the current directory when none is found
/// (the defaults make a config file optional).
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        if config_path.is_file() {
            Ok(config_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(config_path.clone())
        }
    } else {
        let cwd = std::env::current_dir()?;
        Ok(find_project_root(&cwd).unwrap_or(cwd))
    }
}

/// Walks up from `start` looking for the nearest directory containing
/// `trellis.toml`.
fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join("trellis.toml").exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Discovers theme source files in the given directory (recursive).
///
/// Dotfiles and `node_modules` are skipped. Results are sorted by path.
pub fn discover_theme_files(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("source directory {} does not exist", dir.display()).into());
    }
    let mut files = Vec::new();
    walk_dir(dir, &mut files)?;
    files.sort();
    Ok(files)
}

/// Recursively walks a directory collecting regular files.
fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name == "node_modules" {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Maps a source file to its destination in the built theme tree.
///
/// Liquid files land in `layout`/`sections`/`snippets`/`blocks` based on a
/// matching path segment (defaulting to `snippets`), theme JSON lands in
/// `templates`/`locales`/`config` by the same rule, and everything else is
/// flattened into `assets`.
pub fn destination(build_dir: &Path, source_root: &Path, file: &Path) -> PathBuf {
    let relative = file.strip_prefix(source_root).unwrap_or(file);
    let segments = normalize_key(relative);
    let file_name = file.file_name().map(PathBuf::from).unwrap_or_default();

    let dest_dir = if segments.ends_with(".liquid") {
        if has_segment(&segments, "sections") {
            "sections"
        } else if has_segment(&segments, "snippets") {
            "snippets"
        } else if has_segment(&segments, "blocks") {
            "blocks"
        } else if has_segment(&segments, "layout") {
            "layout"
        } else {
            "snippets"
        }
    } else if segments.ends_with(".json") && has_segment(&segments, "templates") {
        "templates"
    } else if segments.ends_with(".json") && has_segment(&segments, "locales") {
        "locales"
    } else if segments.ends_with(".json") && has_segment(&segments, "config") {
        "config"
    } else {
        "assets"
    };

    build_dir.join(dest_dir).join(file_name)
}

fn has_segment(path: &str, segment: &str) -> bool {
    path.split('/').any(|part| part == segment)
}

/// Indexes liquid files by their stem, for resolving `render`/`include`
/// references to source paths.
pub fn snippet_index(files: &[PathBuf]) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    for file in files {
        if file.extension().and_then(|e| e.to_str()) != Some("liquid") {
            continue;
        }
        if let Some(stem) = file.file_stem().and_then(|s| s.to_str()) {
            index.insert(stem.to_string(), file.clone());
        }
    }
    index
}
