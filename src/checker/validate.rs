// src/checker/validate.rs
// =============================================================================
// Decides what kind of link we're looking at and checks it.
//
// Every link ends up in exactly one of these buckets:
//
//   mailto:...            accepted, nothing to check
//   http://, https://     web link, handed to the URL validator (unless
//                         local-only mode is on)
//   page.md#anchor        section link: the anchor must be one of the
//   #anchor               headings of page.md (or of this document)
//   anything else         local file, relative to the linking document
//
// A broken link is recorded as a Finding and checking carries on; nothing in
// here aborts the run.
// =============================================================================

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::anchors::anchors_of;
use super::document::{Document, DocumentCache};
use super::finding::{Finding, Findings};
use super::http::UrlValidator;
use super::ids::IdRegistry;
use super::markdown::{extract_links, Link};
use crate::config::CheckOptions;
use crate::paths::{normalize_lexically, relative_to};

/// How many links of one document are checked at the same time.
const LINK_CONCURRENCY: usize = 50;

/// What a link target points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind<'a> {
    Mail,
    Web,
    /// `page#anchor`; `page` is empty for links within the same document
    Section { page: &'a str, anchor: &'a str },
    File,
}

/// Classifies a link target. Web links win over sections, so
/// `https://example.com/#top` is a web link.
pub fn classify(target: &str) -> LinkKind<'_> {
    if target.starts_with("mailto:") {
        LinkKind::Mail
    } else if is_web_link(target) {
        LinkKind::Web
    } else if let Some((page, anchor)) = target.split_once('#') {
        LinkKind::Section { page, anchor }
    } else {
        LinkKind::File
    }
}

pub fn is_web_link(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// `L` followed by digits only, as in `main.rs#L42`.
pub fn is_line_anchor(anchor: &str) -> bool {
    anchor
        .strip_prefix('L')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Everything a link check needs, borrowed from the Checker for one run.
pub struct LinkValidator<'a> {
    pub root: &'a Path,
    pub options: &'a CheckOptions,
    pub ids: &'a IdRegistry,
    pub urls: &'a UrlValidator,
    pub documents: &'a DocumentCache,
    pub findings: &'a Findings,
}

impl<'a> LinkValidator<'a> {
    /// Reads one markdown file and checks every link in it.
    pub async fn verify_document(&self, path: &Path) {
        let relative = relative_to(self.root, path);
        info!("Verifying {}", relative);

        // only documents targeted by cross-file section links are cached
        let contents: Arc<str> = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents.into(),
            Err(e) => {
                warn!("Cannot read {}: {}", relative, e);
                return;
            }
        };

        let doc = Document {
            path: path.to_path_buf(),
            relative,
            contents,
        };

        let doc = &doc;
        stream::iter(extract_links(&doc.contents))
            .for_each_concurrent(LINK_CONCURRENCY, |link| async move {
                self.validate_link(&link, doc).await;
            })
            .await;
    }

    /// Checks a single link found in `doc`. Returns whether it is fine.
    pub async fn validate_link(&self, link: &Link, doc: &Document) -> bool {
        match classify(&link.target) {
            LinkKind::Mail => true,
            LinkKind::Web if self.options.local_only => true,
            LinkKind::Web => {
                self.urls
                    .validate(&link.target, &doc.relative, self.findings)
                    .await
            }
            LinkKind::Section { page, anchor } => self.validate_section(page, anchor, doc).await,
            LinkKind::File => self.validate_file(&link.target, doc).await.is_some(),
        }
    }

    /// Resolves a local file reference made from `doc`, recording a finding
    /// when it can't be resolved.
    ///
    /// Tries, in order: the path as written, the path with every `_` turned
    /// into `-`, and the front-matter id registry.
    pub async fn validate_file(&self, target: &str, doc: &Document) -> Option<PathBuf> {
        let dir = doc.path.parent().unwrap_or(self.root);
        // leading slashes still mean "next to the linking document"
        let relative_target = target.trim_start_matches(['/', '\\']);

        let direct = dir.join(relative_target);
        if exists(&direct).await {
            return Some(direct);
        }

        // files are sometimes named with hyphens but linked with underscores
        let hyphenated = dir.join(relative_target.replace('_', "-"));
        if exists(&hyphenated).await {
            return Some(hyphenated);
        }

        if let Some(registered) = self.ids.resolve(target) {
            return Some(registered);
        }

        self.findings.push(Finding::FileNotFound {
            target: normalize_lexically(target),
            file: doc.relative.clone(),
        });
        None
    }

    /// Checks `page#anchor` (or `#anchor` when `page` is empty).
    pub async fn validate_section(&self, page: &str, anchor: &str, doc: &Document) -> bool {
        // a bare `#` just points at the top of the page
        if anchor.is_empty() && page.is_empty() {
            return true;
        }

        let (contents, searched, referenced_from) = if page.is_empty() {
            (doc.contents.clone(), doc.relative.clone(), None)
        } else {
            // a missing page is reported once, as a missing file
            let resolved = match self.validate_file(page, doc).await {
                Some(resolved) => resolved,
                None => return false,
            };
            match self.documents.load(&resolved).await {
                Ok(contents) => (
                    contents,
                    normalize_lexically(&relative_to(self.root, &resolved)),
                    Some(doc.relative.clone()),
                ),
                Err(e) => {
                    warn!("Cannot read {} linked from {}: {}", page, doc.relative, e);
                    self.findings.push(Finding::FileNotFound {
                        target: normalize_lexically(page),
                        file: doc.relative.clone(),
                    });
                    return false;
                }
            }
        };

        if anchor.is_empty() {
            return true;
        }

        let anchors = anchors_of(&contents.to_lowercase());
        let wanted = anchor.to_lowercase();
        if anchors.contains(&wanted) || anchors.contains(&wanted.replace('.', "")) {
            return true;
        }

        // section links are never web links, so only the option matters here
        if self.options.allow_local_line_sections && is_line_anchor(anchor) {
            return true;
        }

        self.findings.push(Finding::SectionNotFound {
            anchor: anchor.to_string(),
            searched,
            referenced_from,
            available: anchors,
        });
        false
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusions::ExclusionStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        options: CheckOptions,
        ids: IdRegistry,
        urls: UrlValidator,
        documents: DocumentCache,
        findings: Findings,
    }

    impl Fixture {
        fn new(options: CheckOptions) -> Self {
            let urls = UrlValidator::new("unbroken-test", &ExclusionStore::empty()).unwrap();
            Self {
                dir: TempDir::new().unwrap(),
                options,
                ids: IdRegistry::new(),
                urls,
                documents: DocumentCache::new(),
                findings: Findings::new(),
            }
        }

        fn validator(&self) -> LinkValidator<'_> {
            LinkValidator {
                root: self.dir.path(),
                options: &self.options,
                ids: &self.ids,
                urls: &self.urls,
                documents: &self.documents,
                findings: &self.findings,
            }
        }

        fn write(&self, relative: &str, contents: &str) -> PathBuf {
            let path = self.dir.path().join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, contents).unwrap();
            path
        }

        fn doc(&self, relative: &str, contents: &str) -> Document {
            let path = self.write(relative, contents);
            Document {
                path,
                relative: relative.to_string(),
                contents: Arc::from(contents),
            }
        }

        fn messages(&self) -> Vec<String> {
            self.findings.snapshot().iter().map(|f| f.to_string()).collect()
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("mailto:a@b.c"), LinkKind::Mail);
        assert_eq!(classify("https://example.com/#top"), LinkKind::Web);
        assert_eq!(classify("http://example.com"), LinkKind::Web);
        assert_eq!(classify("#intro"), LinkKind::Section { page: "", anchor: "intro" });
        assert_eq!(
            classify("docs/a.md#setup"),
            LinkKind::Section { page: "docs/a.md", anchor: "setup" }
        );
        assert_eq!(classify("LICENSE"), LinkKind::File);
    }

    #[test]
    fn test_line_anchor_shape() {
        assert!(is_line_anchor("L1"));
        assert!(is_line_anchor("L123"));
        assert!(!is_line_anchor("L"));
        assert!(!is_line_anchor("l12"));
        assert!(!is_line_anchor("L12-L20"));
        assert!(!is_line_anchor("Line"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let fx = Fixture::new(CheckOptions::default());
        let doc = fx.doc("README.md", "[text](missing.md)");

        fx.validator().verify_document(&doc.path).await;

        assert_eq!(fx.messages(), vec!["File not found missing.md while parsing README.md"]);
    }

    #[tokio::test]
    async fn test_existing_file_relative_to_document() {
        let fx = Fixture::new(CheckOptions::default());
        fx.write("docs/guide.md", "# Guide\n");
        let doc = fx.doc("docs/index.md", "[guide](guide.md) [up](../docs/./guide.md)");

        fx.validator().verify_document(&doc.path).await;

        assert!(fx.findings.is_empty());
    }

    #[tokio::test]
    async fn test_target_is_normalized_in_message() {
        let fx = Fixture::new(CheckOptions::default());
        let doc = fx.doc("docs/index.md", "");

        let resolved = fx.validator().validate_file("./sub/../gone.md", &doc).await;

        assert!(resolved.is_none());
        assert_eq!(fx.messages(), vec!["File not found gone.md while parsing docs/index.md"]);
    }

    #[tokio::test]
    async fn test_underscore_falls_back_to_hyphen() {
        let fx = Fixture::new(CheckOptions::default());
        let target = fx.write("getting-started.md", "");
        let doc = fx.doc("README.md", "");

        let resolved = fx.validator().validate_file("getting_started.md", &doc).await;

        assert_eq!(resolved, Some(target));
        assert!(fx.findings.is_empty());
    }

    #[tokio::test]
    async fn test_registered_id_resolves() {
        let fx = Fixture::new(CheckOptions::default());
        let target = fx.write("guides/start.md", "---\nid: quickstart\n---\n# Start\n");
        fx.ids.insert("quickstart", target.clone());
        let doc = fx.doc("README.md", "[start](quickstart#start)");

        fx.validator().verify_document(&doc.path).await;

        assert!(fx.findings.is_empty());
    }

    #[tokio::test]
    async fn test_missing_section_lists_available_anchors() {
        let fx = Fixture::new(CheckOptions::default());
        let doc = fx.doc("README.md", "# Intro\n\n[x](#no-such-heading)\n\n# Setup\n");

        fx.validator().verify_document(&doc.path).await;

        assert_eq!(
            fx.messages(),
            vec![r#"Section no-such-heading not found in README.md. Available anchors: ["intro","setup"]"#]
        );
    }

    #[tokio::test]
    async fn test_sections_match_case_insensitively_and_without_periods() {
        let fx = Fixture::new(CheckOptions::default());
        let doc = fx.doc(
            "README.md",
            "# Getting Started\n# Version 2.0\n[a](#GETTING-STARTED) [b](#version-2.0) [c](#version-20)",
        );

        fx.validator().verify_document(&doc.path).await;

        assert!(fx.findings.is_empty());
    }

    #[tokio::test]
    async fn test_heading_title_starting_with_hash() {
        let fx = Fixture::new(CheckOptions::default());
        let doc = fx.doc("README.md", "# #hashtag
[x](#hashtag)");

        fx.validator().verify_document(&doc.path).await;

        assert!(fx.findings.is_empty());
        assert!(fx.documents.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_headings() {
        let fx = Fixture::new(CheckOptions::default());
        let doc = fx.doc("README.md", "# Notes\ntext\n# Notes\n[second](#notes-1)");

        fx.validator().verify_document(&doc.path).await;

        assert!(fx.findings.is_empty());
    }

    #[tokio::test]
    async fn test_section_in_other_file() {
        let fx = Fixture::new(CheckOptions::default());
        fx.write("docs/install.md", "# Install\n## Linux\n");
        let doc = fx.doc("README.md", "[ok](docs/install.md#linux) [bad](docs/install.md#windows)");

        fx.validator().verify_document(&doc.path).await;

        // the linked page is cached, the crawled one is not
        assert_eq!(fx.documents.len(), 1);
        assert_eq!(
            fx.messages(),
            vec![
                r#"Section windows not found in docs/install.md while parsing README.md. Available anchors: ["install","linux"]"#
            ]
        );
    }

    #[tokio::test]
    async fn test_section_in_missing_file_reports_only_the_file() {
        let fx = Fixture::new(CheckOptions::default());
        let doc = fx.doc("README.md", "[bad](nope.md#intro)");

        fx.validator().verify_document(&doc.path).await;

        assert_eq!(fx.messages(), vec!["File not found nope.md while parsing README.md"]);
    }

    #[tokio::test]
    async fn test_line_sections_need_the_option() {
        let fx = Fixture::new(CheckOptions::default());
        fx.write("main.rs", "fn main() {}\n");
        let doc = fx.doc("README.md", "[entry](main.rs#L1)");

        fx.validator().verify_document(&doc.path).await;
        assert_eq!(fx.findings.len(), 1);

        let fx = Fixture::new(CheckOptions {
            allow_local_line_sections: true,
            ..CheckOptions::default()
        });
        fx.write("main.rs", "fn main() {}\n");
        let doc = fx.doc("README.md", "[entry](main.rs#L1) [bad](main.rs#Lx)");

        fx.validator().verify_document(&doc.path).await;
        assert_eq!(fx.findings.len(), 1);
    }

    #[tokio::test]
    async fn test_mail_and_top_links_are_accepted() {
        let fx = Fixture::new(CheckOptions::default());
        let doc = fx.doc("README.md", "[mail](mailto:someone@example.com) [top](#)");

        fx.validator().verify_document(&doc.path).await;

        assert!(fx.findings.is_empty());
    }

    #[tokio::test]
    async fn test_local_only_skips_web_links() {
        let fx = Fixture::new(CheckOptions {
            local_only: true,
            ..CheckOptions::default()
        });
        let doc = fx.doc("README.md", "[text](https://example.invalid/page)");

        fx.validator().verify_document(&doc.path).await;

        assert!(fx.findings.is_empty());
        assert!(fx.urls.cache().is_empty());
    }

    #[tokio::test]
    async fn test_wrapped_image_checks_both_targets() {
        let fx = Fixture::new(CheckOptions::default());
        fx.write("img/logo.png", "png");
        let doc = fx.doc("README.md", "[![logo](img/logo.png)](missing.md)\n[![logo](img/gone.png)](img/logo.png)");

        fx.validator().verify_document(&doc.path).await;

        let mut messages = fx.messages();
        messages.sort();
        assert_eq!(
            messages,
            vec![
                "File not found img/gone.png while parsing README.md",
                "File not found missing.md while parsing README.md",
            ]
        );
    }
}
