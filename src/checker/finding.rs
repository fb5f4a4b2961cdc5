// src/checker/finding.rs
// =============================================================================
// A single broken link found during a run.
//
// Findings are kept structured while the run is in progress and only
// rendered to text at the end. The rendered text matters: it is what users
// copy into their exclusions file to suppress a known-acceptable failure, so
// the wording below must stay stable between versions.
//
// All paths stored here are already relative to the crawl root with forward
// slashes.
// =============================================================================

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A local file reference that doesn't resolve
    FileNotFound { target: String, file: String },

    /// An anchor that isn't among the headings of the searched document
    SectionNotFound {
        anchor: String,
        /// Document whose headings were searched
        searched: String,
        /// The referencing document, when it differs from `searched`
        #[serde(skip_serializing_if = "Option::is_none")]
        referenced_from: Option<String>,
        available: Vec<String>,
    },

    /// A web link that answered with a failing HTTP status
    UrlUnreachable { url: String, file: String, status: u16 },

    /// A web link that never gave a definitive answer
    UrlUnresolved { url: String, file: String, attempts: usize },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::FileNotFound { target, file } => {
                write!(f, "File not found {} while parsing {}", target, file)
            }
            Finding::SectionNotFound {
                anchor,
                searched,
                referenced_from,
                available,
            } => {
                write!(f, "Section {} not found in {}", anchor, searched)?;
                if let Some(source) = referenced_from {
                    write!(f, " while parsing {}", source)?;
                }
                // serializing a Vec<String> can't fail
                let list = serde_json::to_string(available).unwrap_or_default();
                write!(f, ". Available anchors: {}", list)
            }
            Finding::UrlUnreachable { url, file, status } => {
                write!(f, "URL not found {} while parsing {} (HTTP {})", url, file, status)
            }
            Finding::UrlUnresolved { url, file, attempts } => {
                write!(f, "URL not found {} while parsing {} after {} retries", url, file, attempts)
            }
        }
    }
}

/// The findings of one run, shared by every concurrent check.
#[derive(Debug, Default)]
pub struct Findings {
    items: Mutex<Vec<Finding>>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, finding: Finding) {
        self.items.lock().push(finding);
    }

    /// A copy of everything recorded so far, in the order it was recorded.
    pub fn snapshot(&self) -> Vec<Finding> {
        self.items.lock().clone()
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
