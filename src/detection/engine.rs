//! Detection over a cloned repository.
//!
//! Order of precedence for every context: a user-asserted devfile, a
//! user-asserted Dockerfile, an in-tree devfile, an in-tree Dockerfile, and
//! finally a registry sample picked by the recognizer.

use super::types::{
    CloneState, ComponentRecord, DetectionOutcome, DetectionResult, Request, ROOT_CONTEXT,
};
use crate::devfile::link::trim_context;
use crate::devfile::{
    confine_to_clone, find_devfile, has_raw_form, is_absolute_url, join_context,
    resolve_relative_uri, rewrite_relative_git_link, DevfileError, DevfileParser, DevfileSource,
    ParsedDevfile, DEVFILE_FETCH_TIMEOUT, DEVFILE_LOCATIONS,
};
use crate::dockerfile::{dockerfile_uri_from_devfile, probe_dockerfile};
use crate::error::DetectionError;
use crate::git::url::anonymous_url;
use crate::recognizer::{Recognizer, SelectedType};
use crate::registry::{RegistryClient, RegistryError, DEFAULT_REGISTRY_TIMEOUT};
use crate::util::{Cancelled, OrCancelExt};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct DetectionEngine {
    parser: DevfileParser,
    recognizer: Arc<dyn Recognizer>,
    http: Client,
    registry_timeout: Duration,
}

impl DetectionEngine {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        let http = Client::new();
        Self {
            parser: DevfileParser::with_client(http.clone(), DEVFILE_FETCH_TIMEOUT),
            recognizer,
            http,
            registry_timeout: DEFAULT_REGISTRY_TIMEOUT,
        }
    }

    pub fn with_devfile_timeout(mut self, timeout: Duration) -> Self {
        self.parser = DevfileParser::with_client(self.http.clone(), timeout);
        self
    }

    pub fn with_registry_timeout(mut self, timeout: Duration) -> Self {
        self.registry_timeout = timeout;
        self
    }

    /// Run detection for `request` against an already cloned repository.
    ///
    /// Never fails as a whole: the outcome carries whatever was found plus
    /// the first error hit along the way.
    pub async fn detect(
        &self,
        state: &CloneState,
        request: &Request,
        cancel: &CancellationToken,
    ) -> DetectionOutcome {
        let run = Run::new(self, state, request, cancel);
        let mut result = DetectionResult::new(state.effective_revision.clone());
        let mut error = None;

        run.execute(&mut result, &mut error).await;

        if result.is_empty() && error.is_none() {
            error = Some(DetectionError::no_devfile(run.context.clone()));
        }
        result.prune_ports();

        info!(
            request = %request.name,
            namespace = %request.namespace,
            revision = %result.revision,
            contexts = ?result.contexts(),
            error = error.as_ref().map(|e| e.kind().name()),
            "Detection finished"
        );
        DetectionOutcome { result, error }
    }
}

/// What one context produced. Partial data and an error can coexist.
#[derive(Debug, Default)]
struct PathAnalysis {
    record: Option<ComponentRecord>,
    error: Option<DetectionError>,
}

impl PathAnalysis {
    fn found(record: ComponentRecord) -> Self {
        Self {
            record: Some(record),
            error: None,
        }
    }

    fn failed(error: DetectionError) -> Self {
        Self {
            record: None,
            error: Some(error),
        }
    }

    fn nothing() -> Self {
        Self::default()
    }
}

/// A registry sample selected for a context.
#[derive(Debug)]
struct SampleMatch {
    devfile_url: String,
    devfile: Option<ParsedDevfile>,
    dockerfile: Option<String>,
}

/// Per-request detection state.
struct Run<'a> {
    engine: &'a DetectionEngine,
    state: &'a CloneState,
    request: &'a Request,
    cancel: &'a CancellationToken,
    /// Repository URL without credentials
    repo: String,
    context: String,
    registry: Result<RegistryClient, String>,
}

fn cancelled(_: Cancelled) -> DetectionError {
    DetectionError::internal(Cancelled)
}

fn clean(path: &Path) -> PathBuf {
    path.components().collect()
}

fn keep_first(slot: &mut Option<DetectionError>, error: DetectionError) {
    if slot.is_none() {
        *slot = Some(error);
    } else {
        debug!(error = %error, "Dropping subsequent detection error");
    }
}

impl<'a> Run<'a> {
    fn new(
        engine: &'a DetectionEngine,
        state: &'a CloneState,
        request: &'a Request,
        cancel: &'a CancellationToken,
    ) -> Self {
        let registry_url = request.devfile_registry_url.trim();
        let registry = if registry_url.is_empty() {
            Err("no devfile registry configured".to_string())
        } else {
            RegistryClient::with_client(engine.http.clone(), registry_url, engine.registry_timeout)
                .map_err(|e| e.to_string())
        };

        Self {
            engine,
            state,
            request,
            cancel,
            repo: anonymous_url(&request.repo_url),
            context: request.context(),
            registry,
        }
    }

    fn fs(&self) -> &dyn crate::fs::FileSystem {
        &*self.state.fs
    }

    fn revision(&self) -> Option<&str> {
        Some(self.state.effective_revision.as_str()).filter(|r| !r.is_empty())
    }

    fn registry(&self) -> Result<&RegistryClient, DetectionError> {
        self.registry.as_ref().map_err(DetectionError::internal)
    }

    async fn execute(&self, result: &mut DetectionResult, error: &mut Option<DetectionError>) {
        if let Some(devfile_path) = self.request.asserted_devfile() {
            match self.asserted_devfile(devfile_path).await {
                Ok(Some(record)) => {
                    result.merge(record);
                    return;
                }
                Ok(None) => {
                    debug!(devfile_path, "Asserted devfile is ignorable, treating as absent")
                }
                Err(e) => {
                    *error = Some(e);
                    return;
                }
            }
        }

        if let Some(dockerfile_path) = self.request.asserted_dockerfile() {
            let root = &self.state.component_root;
            let mut record = ComponentRecord::new(self.context.clone());
            record.dockerfile = Some(dockerfile_path.to_string());
            record.ports = self.engine.recognizer.detect_ports(self.fs(), root);
            result.merge(record);
            return;
        }

        let root = self.state.component_root.clone();
        let multi = match self.is_multi_component(&root) {
            Ok(multi) => multi,
            Err(e) => {
                *error = Some(e);
                return;
            }
        };

        if multi {
            self.walk(&root, result, error).await;
        } else {
            let analysis = self.analyze_path(&root, &self.context).await;
            if let Some(record) = analysis.record {
                result.merge(record);
            }
            if let Some(e) = analysis.error {
                keep_first(error, e);
            }
        }
    }

    /// Single component unless the root holds nothing buildable and the
    /// recognizer's first component is somewhere below it.
    fn is_multi_component(&self, root: &Path) -> Result<bool, DetectionError> {
        let fs = self.fs();
        if !fs.is_dir(root) {
            return Err(DetectionError::no_devfile(self.context.clone()));
        }
        if DEVFILE_LOCATIONS.iter().any(|loc| fs.is_file(&root.join(loc)))
            || probe_dockerfile(fs, root).is_some()
        {
            return Ok(false);
        }

        let components = self
            .engine
            .recognizer
            .detect_components(fs, root)
            .map_err(DetectionError::internal)?;

        let multi = match components.first() {
            None => true,
            Some(first) => clean(&first.path) != clean(root),
        };
        debug!(
            root = %root.display(),
            components = components.len(),
            multi,
            "Classified repository layout"
        );
        Ok(multi)
    }

    /// One level under `root`, in name order. Hidden directories are skipped.
    async fn walk(
        &self,
        root: &Path,
        result: &mut DetectionResult,
        error: &mut Option<DetectionError>,
    ) {
        let entries = match self.fs().read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                keep_first(error, DetectionError::internal(e));
                return;
            }
        };

        for entry in entries
            .iter()
            .filter(|e| e.is_dir() && !e.file_name().starts_with('.'))
        {
            if self.cancel.is_cancelled() {
                keep_first(error, cancelled(Cancelled));
                return;
            }

            let context = if self.context == ROOT_CONTEXT {
                entry.file_name().to_string()
            } else {
                join_context(&self.context, entry.file_name())
            };

            let analysis = self.analyze_path(entry.path(), &context).await;
            if analysis.record.is_none() && analysis.error.is_none() {
                debug!(context = %context, "Nothing recognized, skipping");
            }
            if let Some(record) = analysis.record {
                result.merge(record);
            }
            if let Some(e) = analysis.error {
                warn!(context = %context, error = %e, "Detection failed for context");
                keep_first(error, e);
            }
        }
    }

    async fn analyze_path(&self, path: &Path, context: &str) -> PathAnalysis {
        let fs = self.fs();

        let found = match find_devfile(&self.engine.parser, fs, path, &self.state.local_root)
            .or_cancel(self.cancel)
            .await
        {
            Ok(found) => found,
            Err(e) => return PathAnalysis::failed(cancelled(e)),
        };
        match found {
            Ok(Some(found)) => {
                let devfile_url = match self.repo_link(&join_context(context, found.location)) {
                    Ok(url) => url,
                    Err(e) => return PathAnalysis::failed(e),
                };
                info!(context, location = found.location, "Found devfile in repository");
                return match self.devfile_record(context, found.parsed, devfile_url, path) {
                    Ok(record) => PathAnalysis::found(record),
                    Err(e) => PathAnalysis::failed(e),
                };
            }
            Ok(None) => {}
            Err(e) => return PathAnalysis::failed(e.into()),
        }

        if let Some(dockerfile) = probe_dockerfile(fs, path) {
            info!(context, dockerfile = %dockerfile, "Found Dockerfile in repository");
            let mut record = ComponentRecord::new(context);
            record.dockerfile = Some(dockerfile);
            record.ports = self.engine.recognizer.detect_ports(fs, path);

            match self.match_sample(path, context).await {
                Ok(Some(sample)) => {
                    record.devfile_url = Some(sample.devfile_url);
                    if let Some(parsed) = sample.devfile {
                        record.ports.extend(parsed.devfile.endpoint_ports());
                        record.devfile = Some(parsed.as_yaml());
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(context, error = %e, "No registry sample for Dockerfile component")
                }
            }
            return PathAnalysis::found(record);
        }

        let components = match self.engine.recognizer.detect_components(fs, path) {
            Ok(components) => components,
            Err(e) => return PathAnalysis::failed(DetectionError::internal(e)),
        };
        if !components.iter().any(|c| c.can_be_component()) {
            return PathAnalysis::nothing();
        }

        let sample = match self.match_sample(path, context).await {
            Ok(Some(sample)) => sample,
            Ok(None) => return PathAnalysis::failed(DetectionError::no_devfile(context)),
            Err(e) => return PathAnalysis::failed(e),
        };

        let mut record = ComponentRecord::new(context);
        record.ports = self.engine.recognizer.detect_ports(fs, path);
        record.devfile_url = Some(sample.devfile_url);
        if let Some(parsed) = sample.devfile {
            record.ports.extend(parsed.devfile.endpoint_ports());
            record.devfile = Some(parsed.as_yaml());
        }
        record.dockerfile = sample.dockerfile;

        if record.dockerfile.is_none() {
            return PathAnalysis {
                record: Some(record),
                error: Some(DetectionError::no_dockerfile(context)),
            };
        }
        PathAnalysis::found(record)
    }

    /// Devfile named by the request. `None` when it is ignorable.
    async fn asserted_devfile(
        &self,
        devfile_path: &str,
    ) -> Result<Option<ComponentRecord>, DetectionError> {
        let relative = join_context(&self.context, devfile_path);

        let (outcome, devfile_url) = if has_raw_form(&self.repo) {
            let url = rewrite_relative_git_link(&self.repo, self.revision(), &relative)?;
            info!(devfile_url = %url, "Fetching asserted devfile");
            let outcome = self
                .engine
                .parser
                .parse_url(&url)
                .or_cancel(self.cancel)
                .await
                .map_err(cancelled)??;
            (outcome, Some(url))
        } else {
            // no raw endpoint for this host; read the devfile from the clone
            let root = &self.state.local_root;
            let fetch_err = |message: String| DevfileError::Fetch {
                url: relative.clone(),
                message,
            };
            let path = confine_to_clone(self.fs(), root, root, &relative).map_err(fetch_err)?;
            let bytes = self
                .fs()
                .read(&path)
                .map_err(|e| fetch_err(e.to_string()))?;
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.state.local_root.clone());
            let outcome = self
                .engine
                .parser
                .parse_bytes(
                    &bytes,
                    DevfileSource::Local {
                        fs: self.fs(),
                        dir: &dir,
                        root: &self.state.local_root,
                    },
                )
                .or_cancel(self.cancel)
                .await
                .map_err(cancelled)??;
            (outcome, None)
        };

        match outcome.into_valid() {
            Some(parsed) => {
                let root = self.state.component_root.clone();
                self.devfile_record(&self.context, parsed, devfile_url, &root)
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    /// Record for a devfile that lives in the cloned repository.
    fn devfile_record(
        &self,
        context: &str,
        parsed: ParsedDevfile,
        devfile_url: Option<String>,
        path: &Path,
    ) -> Result<ComponentRecord, DetectionError> {
        let fs = self.fs();
        let mut record = ComponentRecord::new(context);

        record.dockerfile = match dockerfile_uri_from_devfile(&parsed.devfile) {
            Some(uri) => Some(self.resolve_in_repo(uri, context)?),
            None => probe_dockerfile(fs, path),
        };

        record.ports = parsed.devfile.endpoint_ports();
        record.ports.extend(self.engine.recognizer.detect_ports(fs, path));
        record.devfile = Some(parsed.as_yaml());
        record.devfile_url = devfile_url;
        Ok(record)
    }

    /// Raw link to `relative` in the request repository, when the host has one.
    fn repo_link(&self, relative: &str) -> Result<Option<String>, DetectionError> {
        if !has_raw_form(&self.repo) {
            return Ok(None);
        }
        rewrite_relative_git_link(&self.repo, self.revision(), relative).map(Some)
    }

    fn resolve_in_repo(&self, uri: &str, context: &str) -> Result<String, DetectionError> {
        if is_absolute_url(uri) || has_raw_form(&self.repo) {
            return resolve_relative_uri(uri, &self.repo, self.revision(), context);
        }
        Ok(trim_context(uri).to_string())
    }

    /// Ask the recognizer to pick a registry sample for `path` and fetch
    /// its devfile. Registry status errors count as "no match".
    async fn match_sample(
        &self,
        path: &Path,
        context: &str,
    ) -> Result<Option<SampleMatch>, DetectionError> {
        let registry = self.registry()?;
        let fs = self.fs();

        let candidates = match registry
            .list_sample_types()
            .or_cancel(self.cancel)
            .await
            .map_err(cancelled)?
        {
            Ok(candidates) => candidates,
            Err(e) if e.is_status() => {
                warn!(
                    registry = registry.registry_url(),
                    error = %e,
                    "Registry unavailable, no sample match"
                );
                return Ok(None);
            }
            Err(e) => return Err(DetectionError::internal(e)),
        };

        let sample = match self
            .engine
            .recognizer
            .select_devfile_type(fs, path, &candidates)
            .map_err(DetectionError::internal)?
        {
            SelectedType::Match(sample) => sample,
            SelectedType::NoMatch => {
                debug!(context, "No registry sample matches");
                return Ok(None);
            }
        };
        info!(context, sample = %sample.name, "Selected registry sample");

        let sample_repo = match registry
            .get_sample_repo(&sample.name)
            .or_cancel(self.cancel)
            .await
            .map_err(cancelled)?
        {
            Ok(repo) => Some(repo).filter(|r| has_raw_form(r)),
            Err(RegistryError::SampleWithoutRemote(_)) => None,
            Err(e) if e.is_status() => return Ok(None),
            Err(e) => return Err(DetectionError::internal(e)),
        };

        let mut devfile_urls = Vec::new();
        if let Some(repo) = sample_repo.as_deref() {
            devfile_urls.push(rewrite_relative_git_link(repo, None, "devfile.yaml")?);
        }
        devfile_urls.push(registry.sample_devfile_url(&sample.name));

        let (devfile_url, devfile) = self.fetch_first_devfile(devfile_urls).await?;

        let dockerfile = match devfile
            .as_ref()
            .and_then(|parsed| dockerfile_uri_from_devfile(&parsed.devfile))
        {
            Some(uri) if is_absolute_url(uri) => Some(uri.to_string()),
            Some(uri) => match sample_repo.as_deref() {
                Some(repo) => Some(rewrite_relative_git_link(repo, None, uri)?),
                None => None,
            },
            None => match sample_repo.as_deref() {
                Some(repo) => {
                    let url = rewrite_relative_git_link(repo, None, "Dockerfile")?;
                    let exists = registry
                        .file_exists(&url)
                        .or_cancel(self.cancel)
                        .await
                        .map_err(cancelled)?;
                    Some(url).filter(|_| exists)
                }
                None => None,
            },
        };

        Ok(Some(SampleMatch {
            devfile_url,
            devfile,
            dockerfile,
        }))
    }

    /// Fetch the first devfile URL that answers. Failure of the last one is
    /// the error.
    async fn fetch_first_devfile(
        &self,
        urls: Vec<String>,
    ) -> Result<(String, Option<ParsedDevfile>), DetectionError> {
        let mut last_error = None;
        for url in urls {
            match self
                .engine
                .parser
                .parse_url(&url)
                .or_cancel(self.cancel)
                .await
                .map_err(cancelled)?
            {
                Ok(outcome) => return Ok((url, outcome.into_valid())),
                Err(e) => {
                    debug!(devfile_url = %url, error = %e, "Sample devfile not available");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .map(DetectionError::from)
            .unwrap_or_else(|| DetectionError::internal("no sample devfile URL")))
    }
}
