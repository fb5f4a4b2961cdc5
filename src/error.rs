// src/error.rs
// =============================================================================
// Fatal errors for a checking run.
//
// Broken links are NOT errors in this sense - they are findings (see
// checker/finding.rs) that get collected and reported at the end. The errors
// here stop the run before it starts: we can't read the directory we were
// asked to crawl, or the exclusions file the user explicitly pointed us at.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    /// The crawl root could not be listed
    #[error("Cannot read directory {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An exclusions file given on the command line could not be read
    #[error("Cannot read exclusions file {path}: {source}")]
    ExclusionsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T, E = CheckError> = std::result::Result<T, E>;
