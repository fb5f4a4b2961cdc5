// src/crawl/walk.rs
// =============================================================================
// This module walks a directory tree looking for markdown files.
//
// How it works:
// 1. List the entries of a directory
// 2. Drop every entry whose path (relative to the crawl root) matches an
//    exclusion pattern - an excluded directory is never even listed
// 3. Recurse into subdirectories, hand every *.md file to the visitor
//
// Sibling entries are visited concurrently (up to FAN_OUT at a time per
// directory). A directory is done once all of its entries are done,
// subdirectories included.
//
// Rust concepts:
// - BoxFuture: an async fn can't call itself directly (its future would
//   contain itself), so the recursive step returns a boxed future
// - Generic visitor: the crawler doesn't know what "visiting" means; the
//   checker passes a closure that validates, or one that only reads ids
// =============================================================================

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{CheckError, Result};
use crate::exclusions::ExclusionStore;
use crate::paths::relative_to;

/// Entries of one directory visited at the same time.
const FAN_OUT: usize = 50;

pub struct Crawler<'a> {
    root: &'a Path,
    exclusions: &'a ExclusionStore,
}

impl<'a> Crawler<'a> {
    pub fn new(root: &'a Path, exclusions: &'a ExclusionStore) -> Self {
        Self { root, exclusions }
    }

    /// Calls `visit` with the path of every non-excluded markdown file under
    /// the root.
    ///
    /// Only an unreadable root is an error. Subdirectories that can't be
    /// read are logged and skipped.
    pub async fn walk<F, Fut>(&self, visit: F) -> Result<()>
    where
        F: Fn(PathBuf) -> Fut + Sync,
        Fut: Future<Output = ()> + Send,
    {
        let entries = list_dir(self.root)
            .await
            .map_err(|source| CheckError::RootUnreadable {
                path: self.root.to_path_buf(),
                source,
            })?;

        self.visit_entries(entries, &visit).await;
        Ok(())
    }

    fn walk_dir<'s, F, Fut>(&'s self, dir: PathBuf, visit: &'s F) -> BoxFuture<'s, ()>
    where
        F: Fn(PathBuf) -> Fut + Sync,
        Fut: Future<Output = ()> + Send + 's,
    {
        async move {
            match list_dir(&dir).await {
                Ok(entries) => self.visit_entries(entries, visit).await,
                Err(e) => warn!("Cannot read directory {}: {}", relative_to(self.root, &dir), e),
            }
        }
        .boxed()
    }

    async fn visit_entries<F, Fut>(&self, entries: Vec<PathBuf>, visit: &F)
    where
        F: Fn(PathBuf) -> Fut + Sync,
        Fut: Future<Output = ()> + Send,
    {
        stream::iter(entries)
            .for_each_concurrent(FAN_OUT, |path| self.visit_entry(path, visit))
            .await;
    }

    async fn visit_entry<F, Fut>(&self, path: PathBuf, visit: &F)
    where
        F: Fn(PathBuf) -> Fut + Sync,
        Fut: Future<Output = ()> + Send,
    {
        let relative = relative_to(self.root, &path);
        if self.exclusions.is_excluded(&relative) {
            info!("Skipping {}.", relative);
            return;
        }

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Cannot stat {}: {}", relative, e);
                return;
            }
        };

        if metadata.is_dir() {
            self.walk_dir(path, visit).await;
        } else if metadata.is_file() && is_markdown(&path) {
            visit(path).await;
        }
    }
}

/// `*.md`, in any letter case.
pub fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase().ends_with(".md"))
        .unwrap_or(false)
}

async fn list_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "# x\n").unwrap();
    }

    async fn visited(root: &Path, rules: &str) -> Vec<String> {
        let rules = ExclusionStore::parse(rules).unwrap();
        let crawler = Crawler::new(root, &rules);
        let seen = Mutex::new(Vec::new());
        crawler
            .walk(|path| {
                let seen = &seen;
                async move { seen.lock().push(relative_to(root, &path)) }
            })
            .await
            .unwrap();
        let mut seen = seen.into_inner();
        seen.sort();
        seen
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("a/README.md")));
        assert!(is_markdown(Path::new("NOTES.MD")));
        assert!(!is_markdown(Path::new("a.markdown")));
        assert!(!is_markdown(Path::new("md")));
    }

    #[tokio::test]
    async fn test_finds_markdown_recursively() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md");
        write(dir.path(), "docs/guide.md");
        write(dir.path(), "docs/deep/er/Notes.MD");
        write(dir.path(), "docs/image.png");

        assert_eq!(
            visited(dir.path(), "").await,
            vec!["README.md", "docs/deep/er/Notes.MD", "docs/guide.md"]
        );
    }

    #[tokio::test]
    async fn test_excluded_directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md");
        write(dir.path(), "node_modules/pkg/README.md");
        write(dir.path(), "docs/vendor/lib.md");
        write(dir.path(), "docs/own.md");

        assert_eq!(
            visited(dir.path(), "!node_modules\n!**/VENDOR\n").await,
            vec!["README.md", "docs/own.md"]
        );
    }

    #[tokio::test]
    async fn test_excluded_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md");
        write(dir.path(), "CHANGELOG.md");

        assert_eq!(visited(dir.path(), "!changelog.md\n").await, vec!["README.md"]);
    }

    #[tokio::test]
    async fn test_unreadable_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let rules = ExclusionStore::empty();
        let result = Crawler::new(&missing, &rules).walk(|_| async {}).await;
        assert!(matches!(result, Err(CheckError::RootUnreadable { .. })));
    }
}
