use super::url::{anonymous_url, authenticated_url, redact};
use super::GitError;
use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Clones a repository and reports the revision that ended up checked out.
#[async_trait]
pub trait GitFetcher: Send + Sync {
    /// Clone `repo_url` into the existing, empty directory `dest`.
    ///
    /// With a `revision` the branch or commit is checked out and returned
    /// unchanged; without one the default branch name is resolved and returned.
    async fn clone_repo(
        &self,
        dest: &Path,
        repo_url: &str,
        revision: Option<&str>,
        token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, GitError>;
}

/// [`GitFetcher`] that shells out to the `git` binary.
///
/// Interactive credential prompts are disabled so a missing or wrong token
/// fails immediately instead of blocking on stdin.
#[derive(Debug, Clone)]
pub struct CommandGitFetcher {
    git_binary: String,
}

impl CommandGitFetcher {
    pub fn new() -> Self {
        Self {
            git_binary: "git".to_string(),
        }
    }

    pub fn with_binary(git_binary: impl Into<String>) -> Self {
        Self {
            git_binary: git_binary.into(),
        }
    }

    fn command(&self, cwd: &Path) -> Command {
        let mut cmd = Command::new(&self.git_binary);
        cmd.current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_ASKPASS", "")
            .env("SSH_ASKPASS", "")
            .env_remove("GIT_CONFIG_PARAMETERS")
            .arg("-c")
            .arg("credential.helper=")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(
        &self,
        mut cmd: Command,
        url_for_errors: &str,
        cancel: &CancellationToken,
    ) -> Result<Output, GitError> {
        let child = cmd.spawn()?;

        // dropping the wait future kills the child (kill_on_drop)
        tokio::select! {
            _ = cancel.cancelled() => Err(GitError::Cancelled {
                url: url_for_errors.to_string(),
            }),
            output = child.wait_with_output() => Ok(output?),
        }
    }
}

impl Default for CommandGitFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GitFetcher for CommandGitFetcher {
    async fn clone_repo(
        &self,
        dest: &Path,
        repo_url: &str,
        revision: Option<&str>,
        token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, GitError> {
        let clone_url = authenticated_url(repo_url, token)?;
        let public_url = anonymous_url(repo_url);
        let token = token.unwrap_or("");
        let revision = revision.map(str::trim).filter(|r| !r.is_empty());

        info!(url = %public_url, revision = revision.unwrap_or(""), "Cloning repository");

        let mut cmd = self.command(dest);
        cmd.arg("clone").arg("--").arg(&clone_url).arg(".");
        let output = self.run(cmd, &public_url, cancel).await?;
        if !output.status.success() {
            let stderr = redact(&String::from_utf8_lossy(&output.stderr), token);
            warn!(url = %public_url, stderr = %stderr.trim(), "git clone failed");
            return Err(classify_git_failure(&public_url, None, &stderr));
        }

        if !token.is_empty() {
            // git stored the credentialed URL in .git/config
            let mut cmd = self.command(dest);
            cmd.arg("remote").arg("set-url").arg("origin").arg(&public_url);
            let output = self.run(cmd, &public_url, cancel).await?;
            if !output.status.success() {
                let stderr = redact(&String::from_utf8_lossy(&output.stderr), token);
                return Err(GitError::Credentials {
                    url: public_url,
                    message: stderr.trim().to_string(),
                });
            }
        }

        if let Some(revision) = revision {
            let mut cmd = self.command(dest);
            cmd.arg("checkout").arg(revision);
            let output = self.run(cmd, &public_url, cancel).await?;
            if !output.status.success() {
                let stderr = redact(&String::from_utf8_lossy(&output.stderr), token);
                debug!(url = %public_url, revision, stderr = %stderr.trim(), "git checkout failed");
                return Err(GitError::RevisionNotFound {
                    url: public_url,
                    revision: revision.to_string(),
                    message: stderr.trim().to_string(),
                });
            }
            return Ok(revision.to_string());
        }

        let mut cmd = self.command(dest);
        cmd.arg("rev-parse").arg("--abbrev-ref").arg("HEAD");
        let output = self.run(cmd, &public_url, cancel).await?;
        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() || branch.is_empty() || branch == "HEAD" {
            let stderr = redact(&String::from_utf8_lossy(&output.stderr), token);
            return Err(GitError::NotFound {
                url: public_url,
                message: format!("unable to resolve default branch: {}", stderr.trim()),
            });
        }

        debug!(url = %public_url, branch = %branch, "Resolved default branch");
        Ok(branch)
    }
}

/// Classify a failed `git clone` from its (already redacted) stderr.
///
/// Anything that is not clearly a credential or revision problem is reported
/// as an unreachable repository; transient and permanent failures are not told
/// apart.
pub fn classify_git_failure(url: &str, revision: Option<&str>, stderr: &str) -> GitError {
    let lower = stderr.to_lowercase();
    let message = stderr.trim().to_string();

    const AUTH_MARKERS: &[&str] = &[
        "authentication failed",
        "could not read username",
        "could not read password",
        "terminal prompts disabled",
        "invalid username or password",
        "the requested url returned error: 401",
        "the requested url returned error: 403",
        "http basic: access denied",
    ];
    const REVISION_MARKERS: &[&str] = &[
        "did not match any file(s) known to git",
        "unknown revision",
        "reference is not a tree",
        "couldn't find remote ref",
    ];

    if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
        return GitError::Authentication {
            url: url.to_string(),
            message,
        };
    }

    if let Some(revision) = revision {
        if REVISION_MARKERS.iter().any(|m| lower.contains(m))
            || (lower.contains("remote branch") && lower.contains("not found"))
        {
            return GitError::RevisionNotFound {
                url: url.to_string(),
                revision: revision.to_string(),
                message,
            };
        }
    }

    GitError::NotFound {
        url: url.to_string(),
        message,
    }
}
