use super::{check_key, ResultRecord, ResultSink, SinkError};
use async_trait::async_trait;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Stores each record as `<root>/<namespace>/<name>.json`.
///
/// Records are written to a temporary file next to the target and renamed
/// over it, so a reader polling the key sees either the old or the new
/// record, never a torn one.
#[derive(Debug, Clone)]
pub struct FileResultSink {
    root: PathBuf,
}

impl FileResultSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, namespace: &str, name: &str) -> PathBuf {
        self.root.join(namespace).join(format!("{}.json", name))
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "record path has no parent"))?;
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn blocking_failed(path: &Path, e: tokio::task::JoinError) -> SinkError {
    SinkError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Other, e),
    }
}

#[async_trait]
impl ResultSink for FileResultSink {
    async fn publish(&self, record: &ResultRecord) -> Result<(), SinkError> {
        check_key(&record.namespace, &record.name)?;
        let path = self.record_path(&record.namespace, &record.name);
        let bytes = serde_json::to_vec_pretty(record)?;

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &bytes))
            .await
            .map_err(|e| blocking_failed(&path, e))?
            .map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;

        info!(
            namespace = %record.namespace,
            name = %record.name,
            path = %path.display(),
            "Published detection result"
        );
        Ok(())
    }

    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<ResultRecord>, SinkError> {
        check_key(namespace, name)?;
        let path = self.record_path(namespace, name);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No result record yet");
                return Ok(None);
            }
            Err(source) => return Err(SinkError::Io { path, source }),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SinkError::Decode {
                key: path.display().to_string(),
                message: e.to_string(),
            })
    }
}
