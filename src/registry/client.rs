use super::types::{DevfileType, IndexEntry};
use reqwest::header::LINK;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(20);

/// Upper bound on `rel="next"` hops when reading the sample index.
pub const MAX_INDEX_PAGES: usize = 50;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid registry URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("registry returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode registry response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("sample {0} not found in registry")]
    SampleNotFound(String),

    #[error("sample {0} has no git remote")]
    SampleWithoutRemote(String),
}

impl RegistryError {
    /// The registry answered with a 4xx/5xx status. Detection degrades this
    /// to "no registry match".
    pub fn is_status(&self) -> bool {
        matches!(self, RegistryError::Status { status, .. } if *status >= 400)
    }
}

/// Client for one registry, scoped to one request.
///
/// The sample index is fetched at most once per client.
pub struct RegistryClient {
    client: Client,
    base: Url,
    timeout: Duration,
    index: OnceCell<Vec<IndexEntry>>,
}

impl RegistryClient {
    pub fn new(registry_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        Self::with_client(Client::new(), registry_url, timeout)
    }

    pub fn with_client(
        client: Client,
        registry_url: &str,
        timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidUrl {
            url: registry_url.to_string(),
            reason,
        };

        let trimmed = registry_url.trim().trim_end_matches('/');
        // keep a trailing slash so `join` appends instead of replacing the last segment
        let base = Url::parse(&format!("{}/", trimmed)).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", base.scheme())));
        }

        Ok(Self {
            client,
            base,
            timeout,
            index: OnceCell::new(),
        })
    }

    pub fn registry_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    pub async fn list_sample_types(&self) -> Result<Vec<DevfileType>, RegistryError> {
        let index = self.index().await?;
        Ok(index.iter().map(IndexEntry::devfile_type).collect())
    }

    /// `git.remotes.origin` of the named sample.
    pub async fn get_sample_repo(&self, name: &str) -> Result<String, RegistryError> {
        let index = self.index().await?;
        let entry = index
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| RegistryError::SampleNotFound(name.to_string()))?;

        entry
            .origin()
            .map(str::to_string)
            .ok_or_else(|| RegistryError::SampleWithoutRemote(name.to_string()))
    }

    /// `<registry>/devfiles/<name>`, which serves the sample's devfile body.
    pub fn sample_devfile_url(&self, name: &str) -> String {
        format!("{}/devfiles/{}", self.registry_url(), name)
    }

    /// Whether `url` answers a GET with 200. Used for files next to a sample
    /// devfile, such as the sample repository's Dockerfile.
    pub async fn file_exists(&self, url: &str) -> bool {
        match self.client.get(url).timeout(self.timeout).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!(url, error = %e, "File probe failed");
                false
            }
        }
    }

    async fn index(&self) -> Result<&Vec<IndexEntry>, RegistryError> {
        self.index.get_or_try_init(|| self.fetch_index()).await
    }

    async fn fetch_index(&self) -> Result<Vec<IndexEntry>, RegistryError> {
        let first = self
            .base
            .join("index/sample")
            .map_err(|e| RegistryError::InvalidUrl {
                url: self.registry_url().to_string(),
                reason: e.to_string(),
            })?;

        let mut entries = Vec::new();
        let mut next = Some(first);
        let mut pages = 0;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_INDEX_PAGES {
                break;
            }

            debug!(url = %url, page = pages, "Fetching registry index page");
            let response = self
                .client
                .get(url.clone())
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| RegistryError::Http {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(RegistryError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link)
                .and_then(|link| url.join(&link).ok());

            let page: Vec<IndexEntry> =
                response.json().await.map_err(|e| RegistryError::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            entries.extend(page);
        }

        info!(
            registry = %self.registry_url(),
            samples = entries.len(),
            "Loaded registry sample index"
        );
        Ok(entries)
    }
}

/// Target of the `rel="next"` entry of an RFC 8288 `Link` header.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample(name: &str, language: &str, project_type: &str) -> serde_json::Value {
        json!({
            "name": name,
            "language": language,
            "projectType": project_type,
            "tags": [language],
            "git": {"remotes": {"origin": format!("https://github.com/devfile-samples/devfile-sample-{}", name)}}
        })
    }

    #[test]
    fn test_next_link() {
        assert_eq!(
            next_link("<https://r.io/index/sample?page=2>; rel=\"next\", <https://r.io/index/sample?page=9>; rel=\"last\""),
            Some("https://r.io/index/sample?page=2".to_string())
        );
        assert_eq!(next_link("<https://r.io/x>; rel=\"prev\""), None);
    }

    #[test]
    fn test_rejects_non_http_registry() {
        assert!(matches!(
            RegistryClient::new("ftp://registry", DEFAULT_REGISTRY_TIMEOUT),
            Err(RegistryError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_index_is_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index/sample"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([sample("nodejs-basic", "JavaScript", "Node.js")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = RegistryClient::new(&server.uri(), DEFAULT_REGISTRY_TIMEOUT).unwrap();
        let types = client.list_sample_types().await.unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].project_type, "Node.js");

        let repo = client.get_sample_repo("nodejs-basic").await.unwrap();
        assert_eq!(
            repo,
            "https://github.com/devfile-samples/devfile-sample-nodejs-basic"
        );
    }

    #[tokio::test]
    async fn test_index_follows_next_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index/sample"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([sample("python-basic", "Python", "Python")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/index/sample"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Link", "</index/sample?page=2>; rel=\"next\"")
                    .set_body_json(json!([sample("go-basic", "Go", "Go")])),
            )
            .mount(&server)
            .await;

        let client = RegistryClient::new(&server.uri(), DEFAULT_REGISTRY_TIMEOUT).unwrap();
        let names: Vec<String> = client
            .list_sample_types()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["go-basic", "python-basic"]);
    }

    #[tokio::test]
    async fn test_status_error_is_flagged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index/sample"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = RegistryClient::new(&server.uri(), DEFAULT_REGISTRY_TIMEOUT).unwrap();
        let err = client.list_sample_types().await.unwrap_err();
        assert!(err.is_status());
    }

    #[tokio::test]
    async fn test_sample_without_remote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index/sample"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "bare"}])))
            .mount(&server)
            .await;

        let client = RegistryClient::new(&server.uri(), DEFAULT_REGISTRY_TIMEOUT).unwrap();
        assert!(matches!(
            client.get_sample_repo("bare").await,
            Err(RegistryError::SampleWithoutRemote(name)) if name == "bare"
        ));
        assert!(matches!(
            client.get_sample_repo("missing").await,
            Err(RegistryError::SampleNotFound(_))
        ));
    }

    #[test]
    fn test_sample_devfile_url() {
        let client =
            RegistryClient::new("https://registry.devfile.io/", DEFAULT_REGISTRY_TIMEOUT).unwrap();
        assert_eq!(
            client.sample_devfile_url("nodejs-basic"),
            "https://registry.devfile.io/devfiles/nodejs-basic"
        );
    }
}
