//! Opening-tag rewrites for the generated class and path marker.
//!
//! Every function here maps the text of one opening tag to its replacement. Nothing outside
//! the tag is read or written, so the host can apply the result as a single replacement over
//! the tag's span.

use std::borrow::Cow;

use serde::Serialize;

use crate::app::attributes::{find_attribute, find_attributes};
use crate::domain::model::{ElementInfo, Span};

/// Replacement text for one span of the original document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub span: Span,
    pub replacement: String,
}

impl TextEdit {
    /// Whether applying the edit would leave `text` unchanged.
    pub fn is_noop(&self, text: &str) -> bool {
        text.get(self.span.as_range()) == Some(self.replacement.as_str())
    }

    /// Produce `text` with the edit applied. Out-of-range spans leave the text untouched.
    pub fn apply(&self, text: &str) -> String {
        match (text.get(..self.span.start), text.get(self.span.end..)) {
            (Some(before), Some(after)) => {
                let mut updated =
                    String::with_capacity(before.len() + self.replacement.len() + after.len());
                updated.push_str(before);
                updated.push_str(&self.replacement);
                updated.push_str(after);
                updated
            }
            _ => {
                tracing::warn!(
                    start = self.span.start,
                    end = self.span.end,
                    "edit span is outside the document"
                );
                text.to_owned()
            }
        }
    }
}

/// Marker attribute name and the value to record in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMarker {
    pub attribute: String,
    pub value: String,
}

/// Add `new_class` to the tag's class list.
///
/// Classes already present are left alone, so repeating the call is a no-op. Without a class
/// attribute, ` class="…"` is inserted before the closing `>` (or `/>`).
pub fn apply_class(tag_text: &str, element: &ElementInfo, new_class: &str) -> String {
    let wanted: Vec<&str> = new_class.split_whitespace().collect();
    if wanted.is_empty() {
        return tag_text.to_owned();
    }

    let Some(class) = element.class.as_ref() else {
        return insert_attribute(tag_text, "class", &wanted.join(" "));
    };

    let existing: Vec<&str> = class.value.split_whitespace().collect();
    let missing: Vec<&str> = wanted
        .into_iter()
        .filter(|token| !existing.contains(token))
        .collect();
    if missing.is_empty() {
        return tag_text.to_owned();
    }

    let addition = escape_attribute_value(&missing.join(" ")).into_owned();
    let current = class.value.trim_end();
    let value = if current.trim_start().is_empty() {
        addition
    } else {
        format!("{current} {addition}")
    };

    let span = class.value_span.relative_to(element.start);
    splice(tag_text, span, &value)
}

/// Set the path-marker attribute to `value`, replacing any previous value.
pub fn apply_path_marker(
    tag_text: &str,
    element: &ElementInfo,
    marker_attribute: &str,
    value: &str,
) -> String {
    let escaped = escape_attribute_value(value);
    match find_attribute(&element.attributes, marker_attribute) {
        Some(existing) if existing.value == escaped => tag_text.to_owned(),
        Some(existing) => {
            let span = existing.value_span.relative_to(element.start);
            splice(tag_text, span, &escaped)
        }
        None => insert_attribute(tag_text, marker_attribute, value),
    }
}

/// Plan the edit that adds `class_name` (and optionally a path marker) to `element`.
pub fn plan_element_edit(
    document_text: &str,
    element: &ElementInfo,
    class_name: &str,
    marker: Option<&PathMarker>,
) -> TextEdit {
    let span = element.span();
    let original = document_text.get(span.as_range()).unwrap_or_default();
    let mut replacement = apply_class(original, element, class_name);

    if let Some(marker) = marker {
        // Spans shift once the class is in; re-read the rewritten tag.
        let rewritten = reparse_tag(&replacement, element);
        replacement = apply_path_marker(&replacement, &rewritten, &marker.attribute, &marker.value);
    }

    tracing::debug!(
        start = span.start,
        end = span.end,
        changed = original != replacement,
        "planned element edit"
    );

    TextEdit { span, replacement }
}

fn reparse_tag(tag_text: &str, element: &ElementInfo) -> ElementInfo {
    let attributes = find_attributes(tag_text, 0);
    ElementInfo {
        tag_name: element.tag_name.clone(),
        start: 0,
        end: tag_text.len(),
        class: find_attribute(&attributes, "class").cloned(),
        path_marker: None,
        attributes,
    }
}

fn insert_attribute(tag_text: &str, name: &str, value: &str) -> String {
    let at = insertion_point(tag_text);
    let value = escape_attribute_value(value);
    format!("{} {name}=\"{value}\"{}", &tag_text[..at], &tag_text[at..])
}

/// Offset right after the last non-space character before `>` or `/>`.
fn insertion_point(tag_text: &str) -> usize {
    let body = tag_text.strip_suffix('>').unwrap_or(tag_text);
    let body = body.strip_suffix('/').unwrap_or(body);
    body.trim_end().len()
}

fn splice(tag_text: &str, span: Span, value: &str) -> String {
    match (tag_text.get(..span.start), tag_text.get(span.end..)) {
        (Some(before), Some(after)) => format!("{before}{value}{after}"),
        _ => {
            tracing::warn!(start = span.start, end = span.end, "attribute span outside tag");
            tag_text.to_owned()
        }
    }
}

fn escape_attribute_value(value: &str) -> Cow<'_, str> {
    if value.contains(['"', '\'']) {
        Cow::Owned(value.replace('"', "&quot;").replace('\'', "&#39;"))
    } else {
        Cow::Borrowed(value)
    }
}
