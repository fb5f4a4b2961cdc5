// src/paths.rs
// =============================================================================
// Small helpers for turning paths into the strings we print and match on.
//
// Everything user-facing (error messages, exclusion matching) uses paths
// relative to the crawl root with forward slashes, so the same exclusions
// file and the same suppression lines work on Windows and Unix alike.
// =============================================================================

use std::path::Path;

/// Replaces every backslash with a forward slash.
pub fn normalize_slashes(s: &str) -> String {
    s.replace('\\', "/")
}

/// Resolves `.` and `..` segments without touching the filesystem.
///
/// Leading `..` segments that can't be resolved are kept, so `../a/./b`
/// stays `../a/b`. An empty result becomes `.`.
pub fn normalize_lexically(s: &str) -> String {
    let s = normalize_slashes(s);
    let absolute = s.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in s.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// `path` relative to `root`, slash-normalized. Paths outside the root are
/// returned whole.
pub fn relative_to(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    normalize_slashes(&relative.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(normalize_lexically("./foo.md"), "foo.md");
        assert_eq!(normalize_lexically("a/../b.md"), "b.md");
        assert_eq!(normalize_lexically("../a/./b"), "../a/b");
        assert_eq!(normalize_lexically("docs\\guide\\..\\intro.md"), "docs/intro.md");
        assert_eq!(normalize_lexically("/x/../../y"), "/y");
        assert_eq!(normalize_lexically("."), ".");
    }

    #[test]
    fn test_relative_to_root() {
        let root = PathBuf::from("/repo");
        assert_eq!(relative_to(&root, &root.join("docs").join("a.md")), "docs/a.md");
        assert_eq!(relative_to(&root, Path::new("/elsewhere/b.md")), "/elsewhere/b.md");
    }
}
