//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// A directory entry returned by read_dir
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub file_type: FileType,
}

impl DirEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }
}

/// Read-only view of a cloned repository.
///
/// Detection never writes through this trait; the clone and the scratch
/// directory are managed by [`crate::workspace::Workspace`].
pub trait FileSystem: Send + Sync {
    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Absolute path with symlinks and `.`/`..` segments resolved. Fails
    /// when the path does not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Read a whole file as raw bytes (devfiles are kept byte-exact)
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// List directory contents, sorted by name
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_entry() {
        let entry = DirEntry {
            path: PathBuf::from("/repo/devfile.yaml"),
            name: "devfile.yaml".to_string(),
            file_type: FileType::File,
        };
        assert_eq!(entry.path(), Path::new("/repo/devfile.yaml"));
        assert_eq!(entry.file_name(), "devfile.yaml");
        assert!(entry.is_file());
        assert!(!entry.is_dir());
    }
}
