//! component-detection - devfile, Dockerfile and port detection for Git repositories
//!
//! Given a repository URL (plus optional revision, context path, token and
//! user assertions), the library clones the repository into a private
//! workspace, decides whether it holds one component or several, and for
//! each component finds a devfile (in-tree or from a devfile registry
//! sample), a Dockerfile and the ports it exposes. The outcome is published
//! as a keyed record holding four maps, the effective revision and at most
//! one error.
//!
//! # Example Usage
//!
//! ```no_run
//! use component_detection::{DetectionService, DetectorConfig, Request};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let service = DetectionService::from_config(DetectorConfig::default());
//! let request = Request::new(
//!     "springboot",
//!     "default",
//!     "https://github.com/devfile-samples/devfile-sample-java-springboot-basic",
//! )
//! .create_result_record(false);
//!
//! let outcome = service.run(request, CancellationToken::new()).await;
//! for (context, url) in &outcome.result.devfile_urls {
//!     println!("{}: {}", context, url);
//! }
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`workspace`]: per-request scratch directories
//! - [`git`]: cloning, token handling and clone error classification
//! - [`devfile`]: devfile parsing, validation, location and raw link rewriting
//! - [`dockerfile`]: Dockerfile discovery
//! - [`registry`]: devfile registry client
//! - [`recognizer`]: language, framework and port heuristics
//! - [`detection`]: the detection engine and the request service
//! - [`sink`]: result record publication

pub mod cli;
pub mod config;
pub mod detection;
pub mod devfile;
pub mod dockerfile;
pub mod error;
pub mod fs;
pub mod git;
pub mod recognizer;
pub mod registry;
pub mod sink;
pub mod util;
pub mod workspace;

pub use config::{ConfigError, DetectorConfig};
pub use detection::{
    CloneState, ComponentRecord, DetectionEngine, DetectionOutcome, DetectionResult,
    DetectionService, Request,
};
pub use error::{DetectionError, ErrorKind};
pub use sink::{FileResultSink, MemoryResultSink, NoopResultSink, ResultRecord, ResultSink};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};
pub use workspace::Workspace;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "component-detection");
    }
}
