use async_trait::async_trait;
use component_detection::git::{GitError, GitFetcher};
use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Helper to get fixture path
#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Recursively copy `src` into the existing directory `dest`.
#[allow(dead_code)]
pub fn copy_tree(src: &Path, dest: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&target)?;
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Write `(relative path, content)` pairs under `root`.
#[allow(dead_code)]
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directory");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
    }
}

/// [`GitFetcher`] that "clones" by copying a fixture directory.
#[allow(dead_code)]
pub struct FixtureFetcher {
    source: PathBuf,
    default_branch: String,
}

#[allow(dead_code)]
impl FixtureFetcher {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            default_branch: "main".to_string(),
        }
    }

    pub fn with_default_branch(mut self, branch: &str) -> Self {
        self.default_branch = branch.to_string();
        self
    }
}

#[async_trait]
impl GitFetcher for FixtureFetcher {
    async fn clone_repo(
        &self,
        dest: &Path,
        _repo_url: &str,
        revision: Option<&str>,
        _token: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<String, GitError> {
        copy_tree(&self.source, dest)?;
        Ok(revision.unwrap_or(&self.default_branch).to_string())
    }
}
