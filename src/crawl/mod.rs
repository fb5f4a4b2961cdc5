// src/crawl/mod.rs
// =============================================================================
// This module handles directory crawling.
//
// Features:
// - Recursive walk starting from the crawl root
// - Skips anything matching an exclusion pattern, before reading it
// - Visits sibling entries concurrently
//
// The crawler only finds files; what happens to each file is up to the
// closure the caller passes in.
// =============================================================================

mod walk;

pub use walk::{is_markdown, Crawler};
