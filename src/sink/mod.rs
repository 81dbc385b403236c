//! Publishing detection results under the request's key.

mod file;
mod memory;
pub mod record;

pub use file::FileResultSink;
pub use memory::MemoryResultSink;
pub use record::ResultRecord;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to decode {key}: {message}")]
    Decode { key: String, message: String },

    #[error("invalid result key {namespace}/{name}")]
    InvalidKey { namespace: String, name: String },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Keyed store of result records. Publishing the same key again replaces
/// the previous record as a whole.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn publish(&self, record: &ResultRecord) -> Result<(), SinkError>;

    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<ResultRecord>, SinkError>;
}

/// Library mode: nothing is published.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResultSink;

#[async_trait]
impl ResultSink for NoopResultSink {
    async fn publish(&self, _record: &ResultRecord) -> Result<(), SinkError> {
        Ok(())
    }

    async fn fetch(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> Result<Option<ResultRecord>, SinkError> {
        Ok(None)
    }
}

/// Keys become path segments; reject anything that could escape the sink root.
pub(crate) fn check_key(namespace: &str, name: &str) -> Result<(), SinkError> {
    let valid = |part: &str| {
        !part.is_empty()
            && part != "."
            && part != ".."
            && !part.contains(['/', '\\', '\0'])
    };
    if valid(namespace) && valid(name) {
        Ok(())
    } else {
        Err(SinkError::InvalidKey {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}
