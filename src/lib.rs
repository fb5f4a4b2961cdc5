// src/lib.rs
// =============================================================================
// unbroken - no more broken links in markdown.
//
// Walks a directory tree, finds every markdown file and checks each link in
// it: links to other local files, links to sections (headings) of a
// document, and web links. Known-acceptable failures can be suppressed and
// whole directories excluded through a `.unbroken_exclusions` file.
//
//   let checker = Checker::new(CheckOptions::new("docs"))?;
//   let errors = checker.process(None).await?;
//
// Module map:
// - config:     CheckOptions, the knobs of a run
// - exclusions: the exclusions/suppressions file
// - crawl:      directory traversal
// - checker:    link extraction, classification and validation
// - error:      fatal errors
// - paths:      slash and dot-segment normalization
// =============================================================================

pub mod checker;
pub mod config;
pub mod crawl;
pub mod error;
pub mod exclusions;
pub mod paths;

pub use checker::{Checker, Finding, Report};
pub use config::CheckOptions;
pub use error::CheckError;
pub use exclusions::ExclusionStore;
