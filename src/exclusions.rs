// src/exclusions.rs
// =============================================================================
// Loads and evaluates the exclusions file (".unbroken_exclusions").
//
// File format - one rule per line, blank lines ignored:
//
//   !node_modules            <- exclusion: a glob matched against paths
//   !docs/**/vendor          <- relative to the crawl root, case-insensitive
//   HTTP/429                 <- sentinel: treat rate-limited URLs as fine
//   HTTP/403                 <- sentinel: treat forbidden URLs as fine
//   File not found x.md while parsing README.md
//                            <- suppression: this exact finding is only a
//                               warning
//
// Exclusions are consulted by the crawler BEFORE it reads or descends into
// anything, suppressions by the checker AFTER all findings are in.
// =============================================================================

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::debug;

use crate::error::{CheckError, Result};
use crate::paths::{normalize_lexically, normalize_slashes};

const IGNORE_429: &str = "HTTP/429";
const IGNORE_403: &str = "HTTP/403";

#[derive(Debug, Default)]
pub struct ExclusionStore {
    /// Compiled `!` patterns; `None` when there are none
    exclusions: Option<GlobSet>,
    /// Literal finding texts (and the HTTP sentinels)
    suppressions: Vec<String>,
}

impl ExclusionStore {
    /// An empty store: nothing excluded, nothing suppressed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads the rules file at `path`.
    ///
    /// A missing file is only an error when the user named it explicitly;
    /// the default location silently degrades to an empty store.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(source) if explicit => Err(CheckError::ExclusionsUnreadable {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) => {
                debug!("No exclusions file at {} ({})", path.display(), e);
                Ok(Self::empty())
            }
        }
    }

    /// Parses rules from the contents of an exclusions file.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut has_exclusions = false;
        let mut suppressions = Vec::new();

        for line in contents.lines().map(str::trim_end) {
            if line.trim().is_empty() {
                continue;
            }

            match line.strip_prefix('!') {
                Some(pattern) => {
                    let pattern = normalize_lexically(pattern.trim());
                    let glob = GlobBuilder::new(&pattern)
                        .case_insensitive(true)
                        .literal_separator(true)
                        .build()
                        .map_err(|source| CheckError::InvalidPattern {
                            pattern: pattern.clone(),
                            source,
                        })?;
                    builder.add(glob);
                    has_exclusions = true;
                }
                None => suppressions.push(normalize_slashes(line)),
            }
        }

        let exclusions = if has_exclusions {
            let set = builder.build().map_err(|source| CheckError::InvalidPattern {
                pattern: "<exclusions>".to_string(),
                source,
            })?;
            Some(set)
        } else {
            None
        };

        Ok(Self {
            exclusions,
            suppressions,
        })
    }

    /// Whether a path (relative to the crawl root) is excluded.
    pub fn is_excluded(&self, relative: &str) -> bool {
        let relative = normalize_slashes(relative);
        self.exclusions
            .as_ref()
            .is_some_and(|set| set.is_match(relative.as_str()))
    }

    /// Whether this exact finding text was listed as a suppression.
    pub fn is_suppressed(&self, text: &str) -> bool {
        self.suppressions.iter().any(|s| s == text)
    }

    /// Whether HTTP 429 responses should count as success.
    pub fn ignores_429(&self) -> bool {
        self.is_suppressed(IGNORE_429)
    }

    /// Whether HTTP 403 responses should count as success.
    pub fn ignores_403(&self) -> bool {
        self.is_suppressed(IGNORE_403)
    }
}
