// src/checker/mod.rs
// =============================================================================
// This module contains all link checking logic.
//
// Submodules:
// - markdown: Extracts links from markdown text
// - anchors:  Computes the heading anchors of a document
// - validate: Classifies each link and checks it
// - http:     Checks web links, with a shared cache and retries
// - ids:      Front-matter id registry for id-style links
// - document: Documents and the per-run contents cache
// - finding:  What a broken link looks like once found
//
// This file holds the Checker, which owns all of the above for one run:
// crawl the tree, validate every markdown file, then split the findings into
// errors and (suppressed) warnings.
// =============================================================================

mod anchors;
mod document;
mod finding;
mod http;
mod ids;
mod markdown;
mod validate;

pub use anchors::{anchors_of, slugify};
pub use document::{Document, DocumentCache};
pub use finding::{Finding, Findings};
pub use http::{UrlCache, UrlOutcome, UrlValidator, MAX_ATTEMPTS};
pub use ids::{front_matter_id, IdRegistry};
pub use markdown::{extract_links, Link, Links};
pub use validate::{classify, is_line_anchor, is_web_link, LinkKind, LinkValidator};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, warn};

use crate::config::CheckOptions;
use crate::crawl::Crawler;
use crate::error::{CheckError, Result};
use crate::exclusions::ExclusionStore;

/// The outcome of a run: findings split by whether they were suppressed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Findings that count as failures
    pub errors: Vec<Finding>,
    /// Findings listed in the suppressions, reported but not counted
    pub warnings: Vec<Finding>,
}

impl Report {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Logs suppressed findings as warnings and the rest as errors.
    pub fn log(&self) {
        for finding in &self.warnings {
            warn!("WARNING: {}", finding);
        }
        for finding in &self.errors {
            error!("ERROR: {}", finding);
        }
    }
}

pub struct Checker {
    options: CheckOptions,
    rules: ExclusionStore,
    ids: IdRegistry,
    urls: UrlValidator,
    documents: DocumentCache,
    findings: Findings,
}

impl Checker {
    /// Loads the exclusions file and prepares the HTTP client.
    pub fn new(mut options: CheckOptions) -> Result<Self> {
        if options.superquiet {
            options.quiet = true;
        }

        let (exclusions_path, explicit) = options.exclusions_path();
        let rules = ExclusionStore::load(&exclusions_path, explicit)?;
        let urls = UrlValidator::new(options.user_agent(), &rules)?;

        Ok(Self {
            options,
            rules,
            ids: IdRegistry::new(),
            urls,
            documents: DocumentCache::new(),
            findings: Findings::new(),
        })
    }

    /// Overrides the pause between retries of a web link.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.urls = self.urls.with_settle_delay(delay);
        self
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Checks every markdown file under `dir` (or the configured directory),
    /// logs the findings and returns how many of them are errors.
    pub async fn process(&self, dir: Option<&Path>) -> Result<usize> {
        let report = self.run(dir).await?;
        report.log();
        Ok(report.error_count())
    }

    /// Like [`Checker::process`], but returns the findings instead of
    /// logging them.
    pub async fn run(&self, dir: Option<&Path>) -> Result<Report> {
        self.reset();

        let root = self.resolve_root(dir).await?;
        let crawler = Crawler::new(&root, &self.rules);

        if self.options.parse_ids {
            crawler
                .walk(|path| async move {
                    if let Err(e) = self.ids.register_file(&path).await {
                        warn!("Cannot read {}: {}", path.display(), e);
                    }
                })
                .await?;
        }

        let validator = LinkValidator {
            root: &root,
            options: &self.options,
            ids: &self.ids,
            urls: &self.urls,
            documents: &self.documents,
            findings: &self.findings,
        };
        let validator = &validator;
        crawler
            .walk(|path| async move { validator.verify_document(&path).await })
            .await?;

        Ok(self.partition())
    }

    // State lives for exactly one run.
    fn reset(&self) {
        self.findings.clear();
        self.urls.cache().clear();
        self.ids.clear();
        self.documents.clear();
    }

    async fn resolve_root(&self, dir: Option<&Path>) -> Result<PathBuf> {
        let dir = dir.unwrap_or(&self.options.dir);
        tokio::fs::canonicalize(dir)
            .await
            .map_err(|source| CheckError::RootUnreadable {
                path: dir.to_path_buf(),
                source,
            })
    }

    // Findings whose exact text is listed in the exclusions file become
    // warnings. Sorting by text keeps repeated runs byte-for-byte identical.
    fn partition(&self) -> Report {
        let mut findings: Vec<(String, Finding)> = self
            .findings
            .snapshot()
            .into_iter()
            .map(|f| (f.to_string(), f))
            .collect();
        findings.sort_by(|a, b| a.0.cmp(&b.0));

        let mut report = Report::default();
        for (text, finding) in findings {
            if self.rules.is_suppressed(&text) {
                report.warnings.push(finding);
            } else {
                report.errors.push(finding);
            }
        }
        report
    }
}
