//! Turning repository links into raw file URLs.
//!
//! `https://github.com/<owner>/<repo>[.git][/tree/<branch>]` becomes
//! `https://raw.githubusercontent.com/<owner>/<repo>/<branch>[/<context>]`.
//! URLs already on a `raw.` host, and URLs on hosts without a known raw
//! endpoint, pass through unchanged.

use crate::error::DetectionError;
use url::Url;

pub const DEFAULT_BRANCH: &str = "main";

/// Hosted Git services and the host serving their raw file content.
const RAW_HOSTS: &[(&str, &str)] = &[
    ("github.com", "raw.githubusercontent.com"),
    ("www.github.com", "raw.githubusercontent.com"),
];

fn raw_host_for(host: &str) -> Option<&'static str> {
    RAW_HOSTS
        .iter()
        .find(|(git_host, _)| git_host.eq_ignore_ascii_case(host))
        .map(|(_, raw)| *raw)
}

/// Strip `./`, `/` prefixes and treat `.` / `./` as "no context".
pub fn trim_context(context: &str) -> &str {
    let mut trimmed = context.trim();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    if trimmed == "." {
        ""
    } else {
        trimmed.trim_end_matches('/')
    }
}

/// Join two repository-relative paths, collapsing root markers.
pub fn join_context(base: &str, rel: &str) -> String {
    match (trim_context(base), trim_context(rel)) {
        ("", "") => "./".to_string(),
        ("", rel) => rel.to_string(),
        (base, "") => base.to_string(),
        (base, rel) => format!("{}/{}", base, rel),
    }
}

pub fn rewrite_relative_git_link(
    repo_url: &str,
    revision: Option<&str>,
    context: &str,
) -> Result<String, DetectionError> {
    let invalid = |cause: &str| DetectionError::InvalidUrl {
        url: crate::git::url::anonymous_url(repo_url),
        cause: cause.to_string(),
    };

    let url = Url::parse(repo_url.trim()).map_err(|e| invalid(&e.to_string()))?;
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;

    if host.to_ascii_lowercase().starts_with("raw.") {
        return Ok(repo_url.to_string());
    }

    let raw_host = match raw_host_for(host) {
        Some(raw) => raw,
        None => return Ok(repo_url.to_string()),
    };

    let path = url.path().trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.len() < 2 {
        return Err(invalid("expected https://<host>/<owner>/<repo>"));
    }

    let (owner, repo) = (segments[0], segments[1].trim_end_matches(".git"));
    let rest = &segments[2..];

    let mut parts: Vec<&str> = vec![owner, repo];
    match rest {
        ["tree", branch, tail @ ..] => {
            parts.push(branch);
            parts.extend_from_slice(tail);
        }
        _ => {
            let branch = revision
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(DEFAULT_BRANCH);
            parts.push(branch);
        }
    }

    let context = trim_context(context);
    if !context.is_empty() {
        parts.push(context);
    }

    Ok(format!("https://{}/{}", raw_host, parts.join("/")))
}

/// Resolve a URI found inside a devfile.
///
/// Absolute `http(s)` URIs are returned as-is; relative ones are rewritten
/// against the repository the devfile lives in.
pub fn resolve_relative_uri(
    uri: &str,
    repo_url: &str,
    revision: Option<&str>,
    context: &str,
) -> Result<String, DetectionError> {
    if is_absolute_url(uri) {
        return Ok(uri.to_string());
    }
    rewrite_relative_git_link(repo_url, revision, &join_context(context, uri))
}

/// Whether `repo_url` is on a host with a known raw file endpoint (or is
/// already a raw link).
pub fn has_raw_form(repo_url: &str) -> bool {
    Url::parse(repo_url.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .map(|host| host.starts_with("raw.") || raw_host_for(&host).is_some())
        .unwrap_or(false)
}

pub fn is_absolute_url(uri: &str) -> bool {
    let lower = uri.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
