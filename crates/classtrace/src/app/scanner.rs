//! Error-tolerant markup scanning over raw document text.
//!
//! Nothing here builds a tree. The scanner answers two questions about a text snapshot:
//! which opening tag sits at (or before) a cursor, and which tags are still open at a given
//! offset. Unbalanced or malformed markup degrades to a best-effort answer instead of an error.
//!
//! All offsets are byte offsets into UTF-8 text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::attributes::{find_attribute, find_attributes};
use crate::domain::model::ElementInfo;

/// Attribute written next to the generated class when path markers are enabled.
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-class-origin";

const SELF_CLOSING_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

static TAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<([A-Za-z][A-Za-z0-9_]*)").expect("tag name pattern is valid"));
static OPENING_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<([A-Za-z][A-Za-z0-9_]*)([^>]*?)(/?)>").expect("opening tag pattern is valid")
});
static CLOSING_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^</([A-Za-z][A-Za-z0-9_]*)\s*>").expect("closing tag pattern is valid")
});

/// Whether `tag_name` is a void element that never takes a closing tag.
pub fn is_self_closing_tag(tag_name: &str) -> bool {
    SELF_CLOSING_TAGS
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(tag_name))
}

/// Tag name of the opening sequence starting exactly at `offset`, if any.
pub fn tag_name_at(text: &str, offset: usize) -> Option<&str> {
    let rest = text.get(offset..)?;
    TAG_NAME
        .captures(rest)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str())
}

/// Find the nearest opening tag at or before `cursor`.
///
/// The tag found is the closest preceding `<` that is not a closing tag; the cursor is not
/// verified to sit inside that element's content.
pub fn locate_element(text: &str, cursor: usize) -> Option<ElementInfo> {
    locate_element_with_marker(text, cursor, DEFAULT_MARKER_ATTRIBUTE)
}

/// [`locate_element`] with a custom path-marker attribute name.
pub fn locate_element_with_marker(
    text: &str,
    cursor: usize,
    marker_attribute: &str,
) -> Option<ElementInfo> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return None;
    }

    let from = cursor.min(bytes.len() - 1);
    let tag_start = (0..=from)
        .rev()
        .find(|&i| bytes[i] == b'<' && bytes.get(i + 1) != Some(&b'/'));

    let Some(tag_start) = tag_start else {
        tracing::debug!(cursor, "no opening tag before cursor");
        return None;
    };

    parse_opening_tag(text, tag_start, marker_attribute)
}

/// Parse the opening tag whose `<` sits at `start`.
pub fn parse_opening_tag(text: &str, start: usize, marker_attribute: &str) -> Option<ElementInfo> {
    let rest = text.get(start..)?;
    let Some(close) = rest.find('>') else {
        tracing::debug!(start, "opening tag is not terminated");
        return None;
    };

    let tag_text = &rest[..=close];
    let Some(tag_name) = TAG_NAME.captures(tag_text).and_then(|caps| caps.get(1)) else {
        tracing::debug!(start, "tag has no name");
        return None;
    };

    let attributes = find_attributes(tag_text, start);
    let class = find_attribute(&attributes, "class").cloned();
    let path_marker = find_attribute(&attributes, marker_attribute).cloned();

    Some(ElementInfo {
        tag_name: tag_name.as_str().to_owned(),
        start,
        end: start + tag_text.len(),
        attributes,
        class,
        path_marker,
    })
}

/// Open-tag stack used while walking a document.
///
/// Closing a tag removes the topmost entry with that name only; closers without a matching
/// entry are ignored and entries that are never closed stay put.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagStack {
    entries: Vec<String>,
}

impl TagStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag_name: impl Into<String>) {
        self.entries.push(tag_name.into());
    }

    /// Remove the topmost entry equal to `tag_name`. Returns `false` when nothing matched.
    pub fn close(&mut self, tag_name: &str) -> bool {
        match self.entries.iter().rposition(|entry| entry == tag_name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

/// Lowercased tag names enclosing `element_offset`, root first, ending with the tag that starts
/// at `element_offset` itself (when there is one).
pub fn compute_ancestor_chain(text: &str, element_offset: usize) -> Vec<String> {
    let limit = element_offset.min(text.len());
    let mut stack = TagStack::new();
    let mut i = 0;

    while i < limit {
        let rest = &text[i..];

        if rest.starts_with(COMMENT_OPEN) {
            i = match rest[COMMENT_OPEN.len()..].find(COMMENT_CLOSE) {
                Some(pos) => i + COMMENT_OPEN.len() + pos + COMMENT_CLOSE.len(),
                None => text.len(),
            };
            continue;
        }

        if rest.starts_with('<') {
            if let Some(caps) = OPENING_TAG.captures(rest) {
                let tag_name = caps[1].to_ascii_lowercase();
                let explicit_close = &caps[3] == "/";
                if !explicit_close && !is_self_closing_tag(&tag_name) {
                    stack.push(tag_name);
                }
                i += caps[0].len();
                continue;
            }

            if let Some(caps) = CLOSING_TAG.captures(rest) {
                let tag_name = caps[1].to_ascii_lowercase();
                if !stack.close(&tag_name) {
                    tracing::trace!(tag = %tag_name, offset = i, "unmatched closing tag");
                }
                i += caps[0].len();
                continue;
            }
        }

        i += rest.chars().next().map_or(1, char::len_utf8);
    }

    if let Some(tag_name) = tag_name_at(text, element_offset) {
        stack.push(tag_name.to_ascii_lowercase());
    }

    stack.into_entries()
}

/// Join an ancestor chain with `>`, e.g. `body>div>span`.
pub fn ancestor_chain_to_string(chain: &[String]) -> String {
    chain.join(">")
}
