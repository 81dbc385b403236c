use super::{DirEntry, FileSystem, FileType};
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Option<Vec<u8>>,
    pub file_type: FileType,
}

/// In-memory [`FileSystem`] for tests.
pub struct MockFileSystem {
    files: RwLock<BTreeMap<PathBuf, MockEntry>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        let fs = Self {
            files: RwLock::new(BTreeMap::new()),
            root: root.clone(),
        };
        fs.add_dir(root);
        fs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent);
        }

        files.insert(
            path,
            MockEntry {
                content: Some(content.as_bytes().to_vec()),
                file_type: FileType::File,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();
        Self::ensure_parents(&mut files, &path);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        // "./devfile.yaml", "a/../devfile.yaml" and "devfile.yaml" are the same key
        let mut normalized = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other),
            }
        }
        normalized
    }

    fn ensure_parents(files: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(MockEntry {
                content: None,
                file_type: FileType::Directory,
            });
        }
    }

    fn entry(&self, path: &Path) -> Option<MockEntry> {
        let path = self.normalize_path(path);
        self.files.read().unwrap().get(&path).cloned()
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        self.entry(path)
            .map(|e| e.file_type == FileType::Directory)
            .unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.entry(path)
            .map(|e| e.file_type == FileType::File)
            .unwrap_or(false)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let path = self.normalize_path(path);
        if self.files.read().unwrap().contains_key(&path) {
            Ok(path)
        } else {
            Err(anyhow!("Path not found: {:?}", path))
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let entry = self
            .entry(path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .ok_or_else(|| anyhow!("Not a file: {:?}", path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("File {:?} is not UTF-8: {}", path, e))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();

        match files.get(&path) {
            Some(entry) if entry.file_type == FileType::Directory => {}
            _ => return Err(anyhow!("Directory not found: {:?}", path)),
        }

        // BTreeMap iteration keeps the listing sorted by name
        let entries = files
            .iter()
            .filter(|(file_path, _)| file_path.parent() == Some(path.as_path()))
            .map(|(file_path, entry)| DirEntry {
                path: file_path.clone(),
                name: file_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("")
                    .to_string(),
                file_type: entry.file_type,
            })
            .collect();

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file() {
        let fs = MockFileSystem::new();
        fs.add_file("devfile.yaml", "schemaVersion: 2.2.0");

        assert!(fs.is_file(Path::new("/mock/devfile.yaml")));
        assert!(fs.is_dir(Path::new("/mock")));
    }

    #[test]
    fn test_read_roundtrips_bytes() {
        let fs = MockFileSystem::new();
        fs.add_file("Dockerfile", "FROM node:18\nEXPOSE 3000\n");

        let bytes = fs.read(Path::new("/mock/Dockerfile")).unwrap();
        assert_eq!(bytes, b"FROM node:18\nEXPOSE 3000\n");
        assert!(fs.read(Path::new("/mock")).is_err());
    }

    #[test]
    fn test_curdir_segments_are_ignored() {
        let fs = MockFileSystem::new();
        fs.add_file("./nodejs/package.json", "{}");

        assert!(fs.is_file(Path::new("/mock/nodejs/package.json")));
        assert!(fs.is_file(Path::new("/mock/./nodejs/package.json")));
    }

    #[test]
    fn test_canonicalize_resolves_parent_segments() {
        let fs = MockFileSystem::new();
        fs.add_file("deploy/k8s.yaml", "kind: Service");

        assert_eq!(
            fs.canonicalize(Path::new("/mock/.devfile/../deploy/k8s.yaml"))
                .unwrap(),
            PathBuf::from("/mock/deploy/k8s.yaml")
        );
        assert!(fs.canonicalize(Path::new("/mock/absent.yaml")).is_err());
    }

    #[test]
    fn test_read_dir_is_sorted() {
        let fs = MockFileSystem::new();
        fs.add_file("python/app.py", "");
        fs.add_file("java/pom.xml", "");
        fs.add_file("README.md", "");

        let entries = fs.read_dir(Path::new("/mock")).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.file_name()).collect();

        assert_eq!(names, vec!["README.md", "java", "python"]);
    }

    #[test]
    fn test_parent_directories_created() {
        let fs = MockFileSystem::with_root(PathBuf::from("/repo"));
        fs.add_file("a/b/c/file.txt", "content");

        assert!(fs.is_dir(Path::new("/repo/a")));
        assert!(fs.is_dir(Path::new("/repo/a/b/c")));
        assert!(fs.read_dir(Path::new("/repo/a/b/c/file.txt")).is_err());
    }
}
