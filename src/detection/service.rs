//! End-to-end handling of one detection request
//!
//! `DetectionService::run` acquires a workspace, clones the repository into
//! it, runs the [`DetectionEngine`], releases the workspace and publishes the
//! outcome. The workspace is removed on every exit path, including panics
//! and cancellation, because [`Workspace`] cleans up on drop.
//!
//! # Example
//!
//! ```no_run
//! use component_detection::{DetectionService, DetectorConfig, Request};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let service = DetectionService::from_config(DetectorConfig::default());
//! let request = Request::new(
//!     "my-component",
//!     "default",
//!     "https://github.com/devfile-samples/devfile-sample-python-basic",
//! );
//!
//! let outcome = service.run(request, CancellationToken::new()).await;
//! println!("Devfile URLs: {:?}", outcome.result.devfile_urls);
//! # }
//! ```

use super::engine::DetectionEngine;
use super::types::{CloneState, DetectionOutcome, Request};
use crate::config::DetectorConfig;
use crate::devfile::link::trim_context;
use crate::error::DetectionError;
use crate::fs::RealFileSystem;
use crate::git::url::anonymous_url;
use crate::git::{CommandGitFetcher, GitFetcher};
use crate::recognizer::HeuristicRecognizer;
use crate::sink::{FileResultSink, ResultRecord, ResultSink};
use crate::workspace::Workspace;
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub struct DetectionService {
    config: DetectorConfig,
    fetcher: Arc<dyn GitFetcher>,
    engine: DetectionEngine,
    sink: Arc<dyn ResultSink>,
}

impl DetectionService {
    pub fn new(
        config: DetectorConfig,
        fetcher: Arc<dyn GitFetcher>,
        engine: DetectionEngine,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            config,
            fetcher,
            engine,
            sink,
        }
    }

    /// `git` binary, heuristic recognizer and a file sink under
    /// `config.result_dir`.
    pub fn from_config(config: DetectorConfig) -> Self {
        let engine = DetectionEngine::new(Arc::new(HeuristicRecognizer::new()))
            .with_devfile_timeout(config.devfile_timeout())
            .with_registry_timeout(config.registry_timeout());
        let sink = Arc::new(FileResultSink::new(config.result_dir.clone()));
        Self::new(config, Arc::new(CommandGitFetcher::new()), engine, sink)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn sink(&self) -> &Arc<dyn ResultSink> {
        &self.sink
    }

    /// Run one request to completion. The returned outcome is what was (or,
    /// with `create_result_record = false`, would have been) published, with
    /// the token scrubbed from it.
    pub async fn run(&self, mut request: Request, cancel: CancellationToken) -> DetectionOutcome {
        if request.devfile_registry_url.trim().is_empty() {
            request.devfile_registry_url = self.config.registry_url.clone();
        }

        let start = Instant::now();
        info!(
            request = %request.name,
            namespace = %request.namespace,
            repo = %anonymous_url(&request.repo_url),
            revision = request.revision().unwrap_or(""),
            context = %request.context(),
            "Starting detection"
        );

        let outcome = self
            .detect(&request, &cancel)
            .await
            .redacted(request.token());

        info!(
            request = %request.name,
            namespace = %request.namespace,
            success = outcome.is_success(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Detection request completed"
        );

        if request.create_result_record {
            self.publish(&request, outcome).await
        } else {
            outcome
        }
    }

    async fn detect(&self, request: &Request, cancel: &CancellationToken) -> DetectionOutcome {
        let workspace = match Workspace::acquire(&request.name, &self.config.scratch_dir) {
            Ok(workspace) => workspace,
            Err(e) => return DetectionOutcome::failed(DetectionError::internal(e)),
        };

        let outcome = self.detect_in(&workspace, request, cancel).await;

        if let Err(e) = workspace.release() {
            warn!(request = %request.name, error = %e, "Failed to release workspace");
        }
        outcome
    }

    async fn detect_in(
        &self,
        workspace: &Workspace,
        request: &Request,
        cancel: &CancellationToken,
    ) -> DetectionOutcome {
        let context = trim_context(&request.context_path);
        if escapes_root(context) {
            return DetectionOutcome::failed(DetectionError::NoDevfileFound {
                location: context.to_string(),
                cause: Some("context path leaves the repository".to_string()),
            });
        }

        let effective_revision = match self
            .fetcher
            .clone_repo(
                workspace.root(),
                &request.repo_url,
                request.revision(),
                request.token(),
                cancel,
            )
            .await
        {
            Ok(revision) => revision,
            Err(e) => {
                let err = e.into_detection_error(
                    &anonymous_url(&request.repo_url),
                    request.revision().unwrap_or(""),
                );
                warn!(
                    request = %request.name,
                    kind = err.kind().name(),
                    "Clone failed"
                );
                return DetectionOutcome::failed(err);
            }
        };

        let local_root = workspace.root().to_path_buf();
        let component_root = if context.is_empty() {
            local_root.clone()
        } else {
            local_root.join(context)
        };

        let state = CloneState {
            local_root,
            component_root,
            effective_revision,
            fs: Arc::new(RealFileSystem::new()),
        };
        self.engine.detect(&state, request, cancel).await
    }

    async fn publish(&self, request: &Request, mut outcome: DetectionOutcome) -> DetectionOutcome {
        let record = ResultRecord::from_outcome(&request.name, &request.namespace, &outcome);
        let published = match record {
            Ok(record) => self.sink.publish(&record).await,
            Err(e) => Err(e),
        };

        if let Err(e) = published {
            error!(
                request = %request.name,
                namespace = %request.namespace,
                error = %e,
                "Failed to publish detection result"
            );
            if outcome.error.is_none() {
                outcome.error = Some(DetectionError::internal(format!(
                    "failed to publish result: {}",
                    e
                )));
            }
        }
        outcome
    }
}

fn escapes_root(context: &str) -> bool {
    Path::new(context)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
}
