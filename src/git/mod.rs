//! Cloning source repositories into a request workspace.

mod fetcher;
pub mod url;

pub use fetcher::{classify_git_failure, CommandGitFetcher, GitFetcher};

use crate::error::DetectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("invalid repository URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("authentication failed for {url}: {message}")]
    Authentication { url: String, message: String },

    #[error("repository {url} not reachable: {message}")]
    NotFound { url: String, message: String },

    #[error("revision {revision} not found in {url}: {message}")]
    RevisionNotFound {
        url: String,
        revision: String,
        message: String,
    },

    #[error("failed to remove credentials from the remote of {url}: {message}")]
    Credentials { url: String, message: String },

    #[error("clone of {url} was cancelled")]
    Cancelled { url: String },

    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// Map onto the published taxonomy. `revision` is the user-supplied one
    /// (may be empty when the default branch was requested).
    pub fn into_detection_error(self, repo_url: &str, revision: &str) -> DetectionError {
        match self {
            GitError::InvalidUrl { url, reason } => {
                DetectionError::InvalidUrl { url, cause: reason }
            }
            GitError::Authentication { url, message } => {
                DetectionError::AuthenticationFailed { url, cause: message }
            }
            GitError::NotFound { url, message } => DetectionError::RepoNotFound {
                url,
                revision: revision.to_string(),
                cause: Some(message),
            },
            GitError::RevisionNotFound {
                url,
                revision,
                message,
            } => DetectionError::RepoNotFound {
                url,
                revision,
                cause: Some(message),
            },
            GitError::Credentials { url, message } => DetectionError::internal(format!(
                "failed to remove credentials from the remote of {}: {}",
                url, message
            )),
            GitError::Cancelled { url } => {
                DetectionError::internal(format!("clone of {} was cancelled", url))
            }
            GitError::Io(e) => DetectionError::RepoNotFound {
                url: url::anonymous_url(repo_url),
                revision: revision.to_string(),
                cause: Some(e.to_string()),
            },
        }
    }
}
