//! Attribute location inside a single opening tag.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::model::{Attribute, Span};

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z0-9_][A-Za-z0-9_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute pattern is valid")
});

/// Extract every quoted `name=value` pair from `tag_text`.
///
/// `origin` is the absolute offset of `tag_text` in the document; returned spans are
/// absolute. Names are lowercased, values kept verbatim. Unquoted values are not recognised.
pub fn find_attributes(tag_text: &str, origin: usize) -> Vec<Attribute> {
    ATTRIBUTE
        .captures_iter(tag_text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            let value = caps.get(2).or_else(|| caps.get(3))?;
            Some(Attribute {
                name: name.as_str().to_ascii_lowercase(),
                value: value.as_str().to_owned(),
                span: Span::new(origin + whole.start(), origin + whole.end()),
                value_span: Span::new(origin + value.start(), origin + value.end()),
            })
        })
        .collect()
}

/// First attribute called `name` (case-insensitive).
pub fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attributes
        .iter()
        .find(|attr| attr.name.eq_ignore_ascii_case(name))
}
