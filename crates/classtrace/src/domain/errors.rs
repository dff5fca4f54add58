//! Domain-specific errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("no opening tag found at offset {offset}")]
    ElementNotFound { offset: usize },
    #[error("rule '{rule}' could not generate a class name")]
    EmptyResult { rule: String },
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("unknown rule '{0}'")]
    UnknownRule(String),
    #[error("offset {offset} is outside the document ({len} bytes)")]
    InvalidOffset { offset: usize, len: usize },
    #[error("position {line}:{column} is outside the document")]
    InvalidPosition { line: usize, column: usize },
}
