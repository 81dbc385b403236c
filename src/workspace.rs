//! Per-request scratch directories.
//!
//! A [`Workspace`] owns one directory under the scratch root. The directory is
//! removed by [`Workspace::release`], or when the value is dropped on any
//! other exit path including panics.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;

const MAX_NAME_LEN: usize = 48;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace under {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("failed to remove workspace {}: {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },
}

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh directory for `request_name` under `scratch_root`.
    ///
    /// The directory name is the sanitized request name plus a random suffix,
    /// so concurrent requests with the same name never share a directory.
    pub fn acquire(request_name: &str, scratch_root: &Path) -> Result<Self, WorkspaceError> {
        let create_err = |source| WorkspaceError::Create {
            path: scratch_root.to_path_buf(),
            source,
        };

        fs::create_dir_all(scratch_root).map_err(create_err)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", sanitize(request_name)))
            .tempdir_in(scratch_root)
            .map_err(create_err)?;

        debug!(path = %dir.path().display(), "Workspace acquired");
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory and report failures. Dropping does the same
    /// silently.
    pub fn release(self) -> Result<(), WorkspaceError> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| WorkspaceError::Remove {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "Workspace released");
        Ok(())
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        "request".to_string()
    } else {
        cleaned
    }
}
