//! Cache-key path normalization.

use std::path::Path;

/// Normalizes a path into the canonical string form used as a cache key.
///
/// Backslashes become forward slashes and a leading `./` is stripped, so the
/// same file produces the same key on every platform and however the caller
/// spelled the path. Purely lexical; the file does not need to exist.
pub fn normalize_key(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    let trimmed = s.strip_prefix("./").unwrap_or(&s);
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_slashes_unchanged() {
        assert_eq!(normalize_key(Path::new("src/css/main.css")), "src/css/main.css");
    }

    #[test]
    fn backslashes_converted() {
        assert_eq!(
            normalize_key(Path::new(r"src\liquid\sections\hero.liquid")),
            "src/liquid/sections/hero.liquid"
        );
    }

    #[test]
    fn leading_dot_slash_stripped() {
        assert_eq!(normalize_key(Path::new("./src/js/app.js")), "src/js/app.js");
    }

    #[test]
    fn absolute_path_kept() {
        assert_eq!(normalize_key(Path::new("/tmp/a.css")), "/tmp/a.css");
    }

    #[test]
    fn same_file_same_key() {
        let a = normalize_key(Path::new("./src/a.css"));
        let b = normalize_key(Path::new("src/a.css"));
        assert_eq!(a, b);
    }
}
