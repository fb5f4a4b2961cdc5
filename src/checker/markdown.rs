// src/checker/markdown.rs
// =============================================================================
// This module extracts links from Markdown text.
//
// We don't run a full CommonMark parser here. We only care about the inline
// link syntax, so a small hand-written scanner walks the raw text looking for:
//
//   [name](target)                     plain link
//   [name](target "title")             link with a title
//   ![alt](image.png)                  image
//   [![alt](badge.svg)](https://ci)    image wrapped in a link: TWO links,
//                                      one for the outer target and one for
//                                      the image source
//
// Rules the scanner follows:
// - A `[` inside an inline code span (an odd number of backticks follows it
//   to the end of the text) never starts a link.
// - Inside the name, a `code span` is skipped whole, so a `]` inside
//   backticks does not end the name early. `\]` doesn't end it either.
// - The target may contain ONE level of balanced parentheses, e.g.
//   https://docs.example.com/cc751383(v=technet.10). Deeper nesting is not
//   balanced: the target ends at the first `)` after the inner group. When
//   no `)` can close the link after the group, the target is read again
//   without one.
// - An optional "title", separated from the target by whitespace, is
//   recognized and kept, but nothing validates it.
//
// Rust concepts:
// - Iterators: extraction is lazy; calling extract_links again on the same
//   text restarts it and yields the same sequence
// - Byte scanning: every delimiter we look for is ASCII, so we can walk bytes
//   and still slice the &str safely at those positions
// =============================================================================

/// One link occurrence found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Display text between the brackets
    pub name: String,
    /// Link destination, exactly as written
    pub target: String,
    /// Optional quoted title after the target
    pub title: Option<String>,
    /// Whether the target is an image source
    pub is_image: bool,
}

/// Returns a lazy iterator over every link in `markdown`, in text order.
pub fn extract_links(markdown: &str) -> Links<'_> {
    let ticks = markdown
        .bytes()
        .enumerate()
        .filter(|(_, b)| *b == b'`')
        .map(|(i, _)| i)
        .collect();

    Links {
        text: markdown,
        pos: 0,
        ticks,
        pending: None,
    }
}

/// Iterator returned by [`extract_links`].
pub struct Links<'a> {
    text: &'a str,
    pos: usize,
    /// Byte offsets of every backtick, for the code-span check
    ticks: Vec<usize>,
    /// Image source of a wrapped image, emitted right after its outer link
    pending: Option<Link>,
}

impl<'a> Iterator for Links<'a> {
    type Item = Link;

    fn next(&mut self) -> Option<Link> {
        if let Some(link) = self.pending.take() {
            return Some(link);
        }

        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let start = match self.text[self.pos..].find('[') {
                Some(offset) => self.pos + offset,
                None => {
                    self.pos = bytes.len();
                    break;
                }
            };

            if self.in_code_span(start) || is_escaped(bytes, start) {
                self.pos = start + 1;
                continue;
            }

            if let Some((outer, image, end)) = self.parse_wrapped_image(start) {
                self.pos = end;
                self.pending = image;
                return Some(outer);
            }

            if let Some((mut link, end)) = self.parse_link(start) {
                link.is_image = start > 0 && bytes[start - 1] == b'!';
                self.pos = end;
                return Some(link);
            }

            self.pos = start + 1;
        }

        None
    }
}

impl<'a> Links<'a> {
    // A `[` is inside a code span when an odd number of backticks follows it.
    fn in_code_span(&self, at: usize) -> bool {
        let before = self.ticks.partition_point(|&t| t < at);
        (self.ticks.len() - before) % 2 == 1
    }

    // Parses `[name](target "title")` starting at the `[` at `start`.
    // Returns the link and the byte offset just past the closing `)`.
    fn parse_link(&self, start: usize) -> Option<(Link, usize)> {
        let bytes = self.text.as_bytes();
        let (name_end, after_name) = scan_name(bytes, start + 1)?;

        let open = skip_whitespace(bytes, after_name);
        if bytes.get(open) != Some(&b'(') {
            return None;
        }

        // a target with a balanced group wins, unless the rest of the link
        // doesn't fit after it; then fall back to a plain target
        let target_start = open + 1;
        let (target_end, (title, end)) = scan_balanced_target(bytes, target_start)
            .and_then(|target_end| Some((target_end, self.close_link(target_end)?)))
            .or_else(|| {
                let target_end = scan_while(bytes, target_start, is_plain_target_byte);
                Some((target_end, self.close_link(target_end)?))
            })?;

        let link = Link {
            name: self.text[start + 1..name_end].to_string(),
            target: self.text[target_start..target_end].to_string(),
            title,
            is_image: false,
        };
        Some((link, end))
    }

    // Parses the optional `"title"` and the closing `)` that follow a target.
    // Returns the title and the offset just past the `)`.
    fn close_link(&self, target_end: usize) -> Option<(Option<String>, usize)> {
        let bytes = self.text.as_bytes();
        let mut cursor = skip_whitespace(bytes, target_end);
        let mut title = None;
        if bytes.get(cursor) == Some(&b'"') {
            let title_start = cursor + 1;
            let title_len = self.text[title_start..].find('"')?;
            title = Some(self.text[title_start..title_start + title_len].to_string());
            cursor = skip_whitespace(bytes, title_start + title_len + 1);
        }

        if bytes.get(cursor) != Some(&b')') {
            return None;
        }
        Some((title, cursor + 1))
    }

    // Parses `[![name](src "title")](target)` starting at `start`.
    // Returns the outer link, the image link (if its source is non-empty)
    // and the offset past the final `)`.
    fn parse_wrapped_image(&self, start: usize) -> Option<(Link, Option<Link>, usize)> {
        let bytes = self.text.as_bytes();
        if bytes.get(start + 1) != Some(&b'!') || bytes.get(start + 2) != Some(&b'[') {
            return None;
        }

        let (inner, inner_end) = self.parse_link(start + 2)?;
        if bytes.get(inner_end) != Some(&b']') || bytes.get(inner_end + 1) != Some(&b'(') {
            return None;
        }

        let target_start = inner_end + 2;
        let target_len = self.text[target_start..].find(')')?;
        if target_len == 0 {
            return None;
        }

        let outer = Link {
            name: inner.name.clone(),
            target: self.text[target_start..target_start + target_len].to_string(),
            title: inner.title.clone(),
            is_image: false,
        };

        let image = (!inner.target.is_empty()).then(|| Link {
            is_image: true,
            ..inner
        });

        Some((outer, image, target_start + target_len + 1))
    }
}

// Scans a link name starting just after the `[`. Returns the offset of the
// closing `]` and the offset after it. Empty names don't count.
fn scan_name(bytes: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                // skip the whole code span if it closes
                match bytes[i + 1..].iter().position(|&b| b == b'`') {
                    Some(len) => i += len + 2,
                    None => i += 1,
                }
            }
            b']' if i == from => return None,
            b']' => return Some((i, i + 1)),
            _ => i += 1,
        }
    }
    None
}

// Scans a target of the form `head(inner)tail` starting just after the `(`,
// where head has no parentheses or whitespace, inner has no `)` or whitespace
// and tail has no parentheses or whitespace. Returns the end offset, or None
// when there is no balanced group right after the head.
fn scan_balanced_target(bytes: &[u8], from: usize) -> Option<usize> {
    let head = scan_while(bytes, from, is_plain_target_byte);
    if bytes.get(head) != Some(&b'(') {
        return None;
    }
    let inner = scan_while(bytes, head + 1, |b| b != b')' && !b.is_ascii_whitespace());
    if bytes.get(inner) != Some(&b')') {
        return None;
    }
    Some(scan_while(bytes, inner + 1, is_plain_target_byte))
}

fn is_plain_target_byte(b: u8) -> bool {
    b != b'(' && b != b')' && !b.is_ascii_whitespace()
}

fn scan_while(bytes: &[u8], from: usize, keep: impl Fn(u8) -> bool) -> usize {
    let mut i = from;
    while i < bytes.len() && keep(bytes[i]) {
        i += 1;
    }
    i
}

fn skip_whitespace(bytes: &[u8], from: usize) -> usize {
    scan_while(bytes, from, |b| b.is_ascii_whitespace())
}

fn is_escaped(bytes: &[u8], at: usize) -> bool {
    at > 0 && bytes[at - 1] == b'\\'
}
