//! Domain models for generation contexts, located elements, and releases.

use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Half-open byte range into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Shift the span so it is expressed relative to `origin`.
    pub fn relative_to(&self, origin: usize) -> Span {
        Span {
            start: self.start - origin,
            end: self.end - origin,
        }
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Read-only inputs shared by every option generator during one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
    pub file_path: String,
    pub relative_path: String,
    pub file_name: String,
    pub file_extension: String,
    pub element_offset: usize,
    pub document_text: String,
}

impl GenerationContext {
    /// Build a context for `file_path`, computing the workspace-relative path against `root`.
    ///
    /// Without a root (or when the file lives outside it) the relative path equals the full
    /// path. The relative path always uses `/` separators.
    pub fn for_file(
        file_path: &Path,
        root: Option<&Path>,
        document_text: impl Into<String>,
        element_offset: usize,
    ) -> Self {
        let relative = root
            .and_then(|root| file_path.strip_prefix(root).ok())
            .unwrap_or(file_path);
        let relative_path = slash_path(relative);

        Self {
            file_path: file_path.to_string_lossy().into_owned(),
            relative_path,
            file_name: file_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_extension: file_path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default(),
            element_offset,
            document_text: document_text.into(),
        }
    }

    /// Same context pointed at another element of the same snapshot.
    pub fn at_offset(&self, element_offset: usize) -> Self {
        Self {
            element_offset,
            ..self.clone()
        }
    }
}

fn slash_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// A single `name="value"` pair found inside an opening tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    pub value: String,
    /// Whole `name="value"` text, absolute offsets.
    pub span: Span,
    /// Text between the quotes, absolute offsets.
    pub value_span: Span,
}

/// Opening tag located in a document snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementInfo {
    /// Tag name as written in the source.
    pub tag_name: String,
    /// Offset of the `<`.
    pub start: usize,
    /// Offset one past the closing `>`.
    pub end: usize,
    pub attributes: Vec<Attribute>,
    pub class: Option<Attribute>,
    pub path_marker: Option<Attribute>,
}

impl ElementInfo {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn has_class(&self) -> bool {
        self.class.is_some()
    }

    pub fn class_value(&self) -> Option<&str> {
        self.class.as_ref().map(|attr| attr.value.as_str())
    }

    pub fn has_path_marker(&self) -> bool {
        self.path_marker.is_some()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }
}

/// A named release that stays active until its expiry date (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub name: String,
    /// `YYYY-MM-DD`, interpreted as UTC midnight.
    pub expiry: String,
}

impl ReleaseEntry {
    pub fn new(name: impl Into<String>, expiry: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expiry: expiry.into(),
        }
    }
}

/// Case transformation applied to the reversed file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    #[default]
    Lowercase,
    Uppercase,
    Preserve,
}

impl CaseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseMode::Lowercase => "lowercase",
            CaseMode::Uppercase => "uppercase",
            CaseMode::Preserve => "preserve",
        }
    }

    pub fn apply(&self, value: &str) -> String {
        match self {
            CaseMode::Lowercase => value.to_lowercase(),
            CaseMode::Uppercase => value.to_uppercase(),
            CaseMode::Preserve => value.to_owned(),
        }
    }
}

impl fmt::Display for CaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseMode {
    type Err = CaseModeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lowercase" | "lower" => Ok(CaseMode::Lowercase),
            "uppercase" | "upper" => Ok(CaseMode::Uppercase),
            "preserve" | "original" | "none" => Ok(CaseMode::Preserve),
            other => Err(CaseModeParseError::UnknownMode(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`CaseMode`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CaseModeParseError {
    #[error("unknown case mode '{0}'")]
    UnknownMode(String),
}
