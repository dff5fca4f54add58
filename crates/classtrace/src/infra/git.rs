//! Workspace discovery through git.

use std::fs;
use std::path::{Path, PathBuf};

/// Lightweight wrapper around [`gix::Repository`] discovery for workspace roots.
#[derive(Default)]
pub struct GitClient {
    repo: Option<gix::Repository>,
}

impl GitClient {
    /// Attempt to locate a git repository containing `path` (a file or directory).
    pub fn discover(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let start = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };
        let repo = match gix::discover(start) {
            Ok(repo) => Some(repo),
            Err(err) => {
                tracing::debug!(path = %start.display(), error = %err, "no git repository");
                None
            }
        };
        Self { repo }
    }

    /// Root of the work tree, canonicalized when possible. Bare repositories have none.
    pub fn workspace_root(&self) -> Option<PathBuf> {
        let root = self.repo.as_ref()?.work_dir()?;
        Some(fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf()))
    }
}

/// Convenience helper to resolve the workspace root for a document path.
pub fn workspace_root_for(path: &Path) -> Option<PathBuf> {
    GitClient::discover(path).workspace_root()
}
