// src/checker/anchors.rs
// =============================================================================
// Turns the headings of a markdown document into the anchors a renderer
// would give them, so `[see setup](#setup)` can be checked.
//
// For each heading line (`#`, `##`, ... at the start of a line):
//   1. drop every character that isn't a letter, digit, `_`, whitespace or `-`
//   2. replace each run of spaces with a single `-`
//   3. if that anchor was already produced earlier in the same document,
//      append `-1`, `-2`, ... using the lowest number not already taken
//
// So two "## Notes" headings become `Notes` and `Notes-1`. Case is kept as
// written; callers lowercase the text first when they want to compare
// case-insensitively.
// =============================================================================

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn heading_regex() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    // the pattern is a constant, so building it can't fail at runtime
    HEADING.get_or_init(|| Regex::new(r"(?m)^#+([^\r\n]*)").expect("valid heading regex"))
}

/// Returns every anchor of `markdown`, in document order, without duplicates.
pub fn anchors_of(markdown: &str) -> Vec<String> {
    let mut anchors = Vec::new();
    let mut seen = HashSet::new();

    for caps in heading_regex().captures_iter(markdown) {
        // the title may itself start with `#`, as in `# #hashtag`
        let title = caps[1].trim_start();
        if title.is_empty() {
            continue;
        }
        let slug = slugify(title);
        let anchor = disambiguate(slug, &seen);
        seen.insert(anchor.clone());
        anchors.push(anchor);
    }

    anchors
}

/// The anchor for a single heading title, before disambiguation.
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_' || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_spaces = false;
    for c in kept.chars() {
        if c == ' ' {
            if !in_spaces {
                slug.push('-');
            }
            in_spaces = true;
        } else {
            slug.push(c);
            in_spaces = false;
        }
    }
    slug
}

fn disambiguate(slug: String, seen: &HashSet<String>) -> String {
    if !seen.contains(&slug) {
        return slug;
    }
    (1..)
        .map(|n| format!("{}-{}", slug, n))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or(slug)
}
