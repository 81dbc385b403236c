//! Configuration for the detector
//!
//! Settings are loaded from environment variables with defaults.
//!
//! # Environment Variables
//!
//! - `DETECTOR_REGISTRY_URL`: Devfile registry used when a request names none - default: "https://registry.devfile.io"
//! - `DETECTOR_SCRATCH_DIR`: Parent directory of per-request workspaces - default: system temp dir
//! - `DETECTOR_RESULT_DIR`: Root of the file result sink - default: system temp dir + "component-detection-results"
//! - `DETECTOR_DEVFILE_TIMEOUT`: Devfile download timeout in seconds - default: "10"
//! - `DETECTOR_REGISTRY_TIMEOUT`: Registry request timeout in seconds - default: "20"
//! - `DETECTOR_LOG_LEVEL`: Logging level - default: "info"
//! - `DETECTOR_LOG_FORMAT`: "text" or "json" - default: "text"
//!
//! # Example
//!
//! ```no_run
//! use component_detection::DetectorConfig;
//!
//! let config = DetectorConfig::default();
//! config.validate().expect("Invalid configuration");
//! ```

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.devfile.io";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "text";
const DEFAULT_DEVFILE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 20;
const MAX_DEVFILE_TIMEOUT_SECS: u64 = 10;
const MAX_REGISTRY_TIMEOUT_SECS: u64 = 30;
const RESULT_DIR_NAME: &str = "component-detection-results";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    pub registry_url: String,

    /// Parent of per-request workspaces
    pub scratch_dir: PathBuf,

    /// Root of the file result sink
    pub result_dir: PathBuf,

    pub devfile_timeout_secs: u64,

    pub registry_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (text, json)
    pub log_format: String,
}

impl Default for DetectorConfig {
    /// Load from `DETECTOR_*` environment variables, falling back to defaults
    /// for anything missing or unparseable.
    fn default() -> Self {
        let registry_url = env::var("DETECTOR_REGISTRY_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

        let scratch_dir = env::var("DETECTOR_SCRATCH_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        let result_dir = env::var("DETECTOR_RESULT_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join(RESULT_DIR_NAME));

        let devfile_timeout_secs = env::var("DETECTOR_DEVFILE_TIMEOUT")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_DEVFILE_TIMEOUT_SECS);

        let registry_timeout_secs = env::var("DETECTOR_REGISTRY_TIMEOUT")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_REGISTRY_TIMEOUT_SECS);

        let log_level = env::var("DETECTOR_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let log_format = env::var("DETECTOR_LOG_FORMAT")
            .unwrap_or_else(|_| DEFAULT_LOG_FORMAT.to_string())
            .to_lowercase();

        Self {
            registry_url,
            scratch_dir,
            result_dir,
            devfile_timeout_secs,
            registry_timeout_secs,
            log_level,
            log_format,
        }
    }
}

impl DetectorConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for out-of-range timeouts, a registry URL that
    /// is not http(s), or an unknown log level or format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_DEVFILE_TIMEOUT_SECS).contains(&self.devfile_timeout_secs) {
            return Err(ConfigError::ValidationFailed(format!(
                "Devfile timeout must be between 1 and {} seconds",
                MAX_DEVFILE_TIMEOUT_SECS
            )));
        }
        if !(1..=MAX_REGISTRY_TIMEOUT_SECS).contains(&self.registry_timeout_secs) {
            return Err(ConfigError::ValidationFailed(format!(
                "Registry timeout must be between 1 and {} seconds",
                MAX_REGISTRY_TIMEOUT_SECS
            )));
        }

        let registry = url::Url::parse(&self.registry_url).map_err(|e| ConfigError::ParseError {
            field: "DETECTOR_REGISTRY_URL".to_string(),
            error: e.to_string(),
        })?;
        if !matches!(registry.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationFailed(format!(
                "Registry URL must be http or https: {}",
                self.registry_url
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        match self.log_format.as_str() {
            "text" | "json" => Ok(()),
            _ => Err(ConfigError::ValidationFailed(format!(
                "Invalid log format: {}. Valid options: text, json",
                self.log_format
            ))),
        }
    }

    pub fn devfile_timeout(&self) -> Duration {
        Duration::from_secs(self.devfile_timeout_secs)
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry_timeout_secs)
    }
}

impl fmt::Display for DetectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Detector Configuration:")?;
        writeln!(f, "  Registry URL: {}", self.registry_url)?;
        writeln!(f, "  Scratch Dir: {}", self.scratch_dir.display())?;
        writeln!(f, "  Result Dir: {}", self.result_dir.display())?;
        writeln!(f, "  Devfile Timeout: {}s", self.devfile_timeout_secs)?;
        writeln!(f, "  Registry Timeout: {}s", self.registry_timeout_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Log Format: {}", self.log_format)?;
        Ok(())
    }
}
