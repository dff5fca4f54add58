//! Document snapshots read from and written back to disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::mutate::TextEdit;
use crate::domain::errors::DomainError;
use crate::domain::model::GenerationContext;

/// Where in the document the caller is pointing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Byte offset into the UTF-8 text.
    Offset(usize),
    /// 1-based line and column; columns count characters.
    LineColumn { line: usize, column: usize },
}

/// Frozen text of one file for a single locate/generate/mutate cycle.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    path: PathBuf,
    text: String,
}

impl DocumentSnapshot {
    /// Read `path` from disk. The stored path is canonicalized when possible.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read document: {}", path.display()))?;
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self { path, text })
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Translate a caller position into a byte offset.
    pub fn resolve(&self, position: Position) -> Result<usize, DomainError> {
        match position {
            Position::Offset(offset) if offset <= self.text.len() => Ok(offset),
            Position::Offset(offset) => Err(DomainError::InvalidOffset {
                offset,
                len: self.text.len(),
            }),
            Position::LineColumn { line, column } => {
                offset_for_line_column(&self.text, line, column)
                    .ok_or(DomainError::InvalidPosition { line, column })
            }
        }
    }

    /// Generation context for the element at `offset`, relative to `root` when given.
    pub fn context(&self, root: Option<&Path>, offset: usize) -> GenerationContext {
        GenerationContext::for_file(&self.path, root, self.text.clone(), offset)
    }

    /// Apply `edit` and write the file. Returns `false` without touching disk when the edit
    /// changes nothing.
    pub fn write_edit(&self, edit: &TextEdit) -> Result<bool> {
        if edit.is_noop(&self.text) {
            return Ok(false);
        }
        let updated = edit.apply(&self.text);
        fs::write(&self.path, updated)
            .with_context(|| format!("failed to write document: {}", self.path.display()))?;
        Ok(true)
    }
}

/// Byte offset of a 1-based `line`/`column` pair. One column past the last character of a
/// line addresses the end of that line.
pub fn offset_for_line_column(text: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 || column == 0 {
        return None;
    }

    let mut line_start = 0;
    let mut lines = 0;
    for (index, raw) in text.split_inclusive('\n').enumerate() {
        lines = index + 1;
        if lines == line {
            let content = raw.strip_suffix('\n').unwrap_or(raw);
            let content = content.strip_suffix('\r').unwrap_or(content);
            return content
                .char_indices()
                .map(|(offset, _)| offset)
                .chain(std::iter::once(content.len()))
                .nth(column - 1)
                .map(|offset| line_start + offset);
        }
        line_start += raw.len();
    }

    // Empty final line after a trailing newline (or an empty document).
    let open_last_line = text.is_empty() || text.ends_with('\n');
    (open_last_line && line == lines + 1 && column == 1).then_some(text.len())
}
