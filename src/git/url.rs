//! Repository URL handling: validation, credential embedding and redaction.

use super::GitError;
use url::Url;

const REDACTED: &str = "***";

/// Parse and validate a repository URL.
///
/// Only `http(s)` URLs with a host are accepted; SSH-style remotes cannot carry
/// a token and are rejected up front.
pub fn validate_repo_url(repo_url: &str) -> Result<Url, GitError> {
    let url = Url::parse(repo_url.trim()).map_err(|e| GitError::InvalidUrl {
        url: repo_url.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(GitError::InvalidUrl {
                url: repo_url.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            })
        }
    }

    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(GitError::InvalidUrl {
            url: repo_url.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Build the URL actually handed to `git clone`.
///
/// With a token the URL carries `token:<token>@` Basic credentials, otherwise
/// the anonymous form is returned. Any user info already present is replaced.
pub fn authenticated_url(repo_url: &str, token: Option<&str>) -> Result<String, GitError> {
    let mut url = validate_repo_url(repo_url)?;
    let invalid = |reason: &str| GitError::InvalidUrl {
        url: anonymous_url(repo_url),
        reason: reason.to_string(),
    };

    match token.filter(|t| !t.is_empty()) {
        Some(token) => {
            url.set_username("token")
                .map_err(|_| invalid("cannot set credentials"))?;
            url.set_password(Some(token))
                .map_err(|_| invalid("cannot set credentials"))?;
        }
        None => {
            url.set_username("")
                .map_err(|_| invalid("cannot clear credentials"))?;
            url.set_password(None)
                .map_err(|_| invalid("cannot clear credentials"))?;
        }
    }

    Ok(url.to_string())
}

/// Strip any user info from a URL so it can be logged or published.
pub fn anonymous_url(repo_url: &str) -> String {
    match Url::parse(repo_url) {
        Ok(mut url) => {
            if url.username().is_empty() && url.password().is_none() {
                return repo_url.to_string();
            }
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.to_string()
        }
        Err(_) => repo_url.to_string(),
    }
}

/// Replace every occurrence of `token` in `text`.
pub fn redact(text: &str, token: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, REDACTED)
}
