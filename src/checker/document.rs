// src/checker/document.rs
// =============================================================================
// Markdown documents and the per-run cache of their contents.
//
// A document is read once when the crawler reaches it. Documents that other
// documents link into (`other.md#install`) are kept in the cache, so each is
// read from disk once per run however many links point at it. Contents never
// change during a run.
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A markdown file being validated.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the crawl root, with `/` separators
    pub relative: String,
    pub contents: Arc<str>,
}

#[derive(Debug, Default)]
pub struct DocumentCache {
    contents: Mutex<HashMap<PathBuf, Arc<str>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of `path`, read from disk the first time only.
    pub async fn load(&self, path: &Path) -> std::io::Result<Arc<str>> {
        if let Some(contents) = self.contents.lock().get(path) {
            return Ok(contents.clone());
        }

        let contents: Arc<str> = tokio::fs::read_to_string(path).await?.into();
        self.contents
            .lock()
            .insert(path.to_path_buf(), contents.clone());
        Ok(contents)
    }

    pub fn clear(&self) {
        self.contents.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.contents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_contents_are_read_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "# Before\n").unwrap();

        let cache = DocumentCache::new();
        assert_eq!(&*cache.load(&path).await.unwrap(), "# Before\n");

        // later changes on disk are not seen within the same run
        std::fs::write(&path, "# After\n").unwrap();
        assert_eq!(&*cache.load(&path).await.unwrap(), "# Before\n");

        cache.clear();
        assert_eq!(&*cache.load(&path).await.unwrap(), "# After\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = DocumentCache::new();
        assert!(cache.load(&dir.path().join("nope.md")).await.is_err());
    }
}
