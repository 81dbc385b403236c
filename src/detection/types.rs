use crate::devfile::link::trim_context;
use crate::error::DetectionError;
use crate::fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Context key of the repository root.
pub const ROOT_CONTEXT: &str = "./";

/// One detection request. Immutable once built.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Request {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "repoURL", alias = "repoUrl")]
    pub repo_url: String,
    pub revision: Option<String>,
    pub context_path: String,
    #[serde(rename = "devfileRegistryURL", alias = "devfileRegistryUrl")]
    pub devfile_registry_url: String,
    pub git_token: Option<String>,
    pub create_result_record: bool,
    pub devfile_path: Option<String>,
    pub dockerfile_path: Option<String>,
    pub is_devfile_present: bool,
    pub is_dockerfile_present: bool,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            name: String::new(),
            namespace: String::new(),
            repo_url: String::new(),
            revision: None,
            context_path: ROOT_CONTEXT.to_string(),
            devfile_registry_url: String::new(),
            git_token: None,
            create_result_record: true,
            devfile_path: None,
            dockerfile_path: None,
            is_devfile_present: false,
            is_dockerfile_present: false,
        }
    }
}

impl Request {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        repo_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            repo_url: repo_url.into(),
            ..Default::default()
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_path = context.into();
        self
    }

    pub fn with_registry(mut self, registry_url: impl Into<String>) -> Self {
        self.devfile_registry_url = registry_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.git_token = Some(token.into());
        self
    }

    pub fn with_devfile(mut self, devfile_path: impl Into<String>) -> Self {
        self.is_devfile_present = true;
        self.devfile_path = Some(devfile_path.into());
        self
    }

    pub fn with_dockerfile(mut self, dockerfile_path: impl Into<String>) -> Self {
        self.is_dockerfile_present = true;
        self.dockerfile_path = Some(dockerfile_path.into());
        self
    }

    pub fn create_result_record(mut self, create: bool) -> Self {
        self.create_result_record = create;
        self
    }

    /// Context key: `"./"` for the repository root, otherwise the trimmed
    /// relative path.
    pub fn context(&self) -> String {
        match trim_context(&self.context_path) {
            "" => ROOT_CONTEXT.to_string(),
            context => context.to_string(),
        }
    }

    pub fn revision(&self) -> Option<&str> {
        non_empty(self.revision.as_deref())
    }

    pub fn token(&self) -> Option<&str> {
        non_empty(self.git_token.as_deref())
    }

    /// Path of the user-asserted devfile, when the assertion is usable.
    pub fn asserted_devfile(&self) -> Option<&str> {
        if self.is_devfile_present {
            non_empty(self.devfile_path.as_deref())
        } else {
            None
        }
    }

    pub fn asserted_dockerfile(&self) -> Option<&str> {
        if self.is_dockerfile_present {
            non_empty(self.dockerfile_path.as_deref())
        } else {
            None
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("repo_url", &crate::git::url::anonymous_url(&self.repo_url))
            .field("revision", &self.revision)
            .field("context_path", &self.context_path)
            .field("devfile_registry_url", &self.devfile_registry_url)
            .field("git_token", &self.token().map(|_| "***"))
            .field("create_result_record", &self.create_result_record)
            .field("devfile_path", &self.devfile_path)
            .field("dockerfile_path", &self.dockerfile_path)
            .field("is_devfile_present", &self.is_devfile_present)
            .field("is_dockerfile_present", &self.is_dockerfile_present)
            .finish()
    }
}

/// A cloned repository, owned by one request.
#[derive(Clone)]
pub struct CloneState {
    pub local_root: PathBuf,
    pub component_root: PathBuf,
    pub effective_revision: String,
    pub fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for CloneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloneState")
            .field("local_root", &self.local_root)
            .field("component_root", &self.component_root)
            .field("effective_revision", &self.effective_revision)
            .finish_non_exhaustive()
    }
}

/// What detection found for a single context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentRecord {
    pub context: String,
    pub devfile: Option<String>,
    pub devfile_url: Option<String>,
    pub dockerfile: Option<String>,
    pub ports: Vec<u16>,
}

impl ComponentRecord {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.devfile.is_none() && self.devfile_url.is_none() && self.dockerfile.is_none()
    }
}

/// The four published maps plus the effective revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// context -> devfile YAML
    pub devfiles: BTreeMap<String, String>,
    /// context -> absolute devfile URL
    pub devfile_urls: BTreeMap<String, String>,
    /// context -> Dockerfile path or URL
    pub dockerfiles: BTreeMap<String, String>,
    /// context -> exposed ports, ascending
    pub ports: BTreeMap<String, Vec<u16>>,
    pub revision: String,
}

impl DetectionResult {
    pub fn new(revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            ..Default::default()
        }
    }

    pub fn merge(&mut self, record: ComponentRecord) {
        let ComponentRecord {
            context,
            devfile,
            devfile_url,
            dockerfile,
            ports,
        } = record;

        if let Some(devfile) = devfile {
            self.devfiles.insert(context.clone(), devfile);
        }
        if let Some(url) = devfile_url {
            self.devfile_urls.insert(context.clone(), url);
        }
        if let Some(dockerfile) = dockerfile {
            self.dockerfiles.insert(context.clone(), dockerfile);
        }
        if !ports.is_empty() && self.has_build_entry(&context) {
            let merged = self.ports.entry(context).or_default();
            merged.extend(ports);
            merged.sort_unstable();
            merged.dedup();
        }
    }

    /// Whether `context` has a devfile or a Dockerfile entry.
    pub fn has_build_entry(&self, context: &str) -> bool {
        self.devfiles.contains_key(context) || self.dockerfiles.contains_key(context)
    }

    /// Drop port entries whose context has neither a devfile nor a Dockerfile.
    pub fn prune_ports(&mut self) {
        let orphans: Vec<String> = self
            .ports
            .keys()
            .filter(|ctx| !self.has_build_entry(ctx))
            .cloned()
            .collect();
        for ctx in orphans {
            self.ports.remove(&ctx);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.devfiles.is_empty() && self.devfile_urls.is_empty() && self.dockerfiles.is_empty()
    }

    /// Every context present in any of the maps, sorted.
    pub fn contexts(&self) -> Vec<&str> {
        let mut contexts: Vec<&str> = self
            .devfiles
            .keys()
            .chain(self.devfile_urls.keys())
            .chain(self.dockerfiles.keys())
            .chain(self.ports.keys())
            .map(String::as_str)
            .collect();
        contexts.sort_unstable();
        contexts.dedup();
        contexts
    }
}

/// Result of one request: possibly partial data plus at most one error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionOutcome {
    pub result: DetectionResult,
    pub error: Option<DetectionError>,
}

impl DetectionOutcome {
    pub fn failed(error: DetectionError) -> Self {
        Self {
            result: DetectionResult::default(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Scrub `token` from everything that gets published.
    pub fn redacted(mut self, token: Option<&str>) -> Self {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return self,
        };
        let scrub = |map: &mut BTreeMap<String, String>| {
            for value in map.values_mut() {
                if value.contains(token) {
                    *value = crate::git::url::redact(value, token);
                }
            }
        };
        scrub(&mut self.result.devfile_urls);
        scrub(&mut self.result.devfiles);
        scrub(&mut self.result.dockerfiles);
        self.error = self.error.map(|e| e.redacted(Some(token)));
        self
    }
}
