//! Infrastructure adapters for files, git, config, clipboard, and logging.

pub mod clipboard;
pub mod config;
pub mod document;
pub mod git;
pub mod logging;
