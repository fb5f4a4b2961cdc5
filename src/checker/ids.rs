// src/checker/ids.rs
// =============================================================================
// Front-matter identifier registry.
//
// Some doc sites (Docusaurus, for one) let pages link to each other by an id
// declared at the top of the file instead of by path:
//
//   ---
//   id: getting-started
//   title: Getting Started
//   ---
//
// When `parse-ids` is on, a first pass over the tree records every such id,
// and a local link that doesn't resolve as a path gets one more chance as an
// id before it is reported.
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct IdRegistry {
    ids: Mutex<HashMap<String, PathBuf>>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path` and records its front-matter id, if it has one.
    pub async fn register_file(&self, path: &Path) -> std::io::Result<()> {
        let contents = tokio::fs::read_to_string(path).await?;
        if let Some(id) = front_matter_id(&contents) {
            self.ids.lock().insert(id.to_string(), path.to_path_buf());
        }
        Ok(())
    }

    pub fn insert(&self, id: impl Into<String>, path: impl Into<PathBuf>) {
        self.ids.lock().insert(id.into(), path.into());
    }

    /// The file registered under `id`.
    pub fn resolve(&self, id: &str) -> Option<PathBuf> {
        self.ids.lock().get(id).cloned()
    }

    pub fn clear(&self) {
        self.ids.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The `id:` value when the (non-empty) lines of `contents` start with `---`
/// followed by `id: <value>`.
pub fn front_matter_id(contents: &str) -> Option<&str> {
    let mut lines = contents.split(['\r', '\n']).filter(|l| !l.is_empty());
    let first = lines.next()?;
    let second = lines.next()?;
    // there has to be something after the id line, normally the closing ---
    lines.next()?;

    if first.trim() != "---" {
        return None;
    }

    let prefix = second.get(..3)?;
    if !prefix.eq_ignore_ascii_case("id:") {
        return None;
    }
    let id = second[3..].trim();
    (!id.is_empty()).then_some(id)
}
