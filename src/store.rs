use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::StorageError;

/// Where documents live. Paths are `/`-separated and relative to the store.
pub trait DocumentStore {
    fn read(&self, path: &str) -> Result<String, StorageError>;
    fn write(&mut self, path: &str, text: &str) -> Result<(), StorageError>;
}

/// Keeps documents in a map; used by tests and embedders.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    documents: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, path: &str) -> Result<String, StorageError> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_string(),
            })
    }

    fn write(&mut self, path: &str, text: &str) -> Result<(), StorageError> {
        self.documents.insert(path.to_string(), text.to_string());
        Ok(())
    }
}

/// Documents as files under a root directory, such as an Obsidian vault.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|part| !matches!(part, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(StorageError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl DocumentStore for DirStore {
    fn read(&self, path: &str) -> Result<String, StorageError> {
        let full = self.resolve(path)?;
        std::fs::read_to_string(&full).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                path: path.to_string(),
            },
            _ => StorageError::Io {
                path: path.to_string(),
                source,
            },
        })
    }

    fn write(&mut self, path: &str, text: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        let io_err = |source: std::io::Error| StorageError::Io {
            path: path.to_string(),
            source,
        };
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&full, text).map_err(io_err)?;
        tracing::debug!(path = %full.display(), bytes = text.len(), "wrote document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.read("a.md"),
            Err(StorageError::NotFound { .. })
        ));
        store.write("a.md", "hello").unwrap();
        assert_eq!(store.read("a.md").unwrap(), "hello");
        assert_eq!(store.paths().collect::<Vec<_>>(), vec!["a.md"]);
    }

    #[test]
    fn dir_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::new(dir.path());
        store.write("nested/deeper/flow.excalidraw.md", "doc").unwrap();
        assert_eq!(store.read("nested/deeper/flow.excalidraw.md").unwrap(), "doc");
        assert!(dir.path().join("nested/deeper/flow.excalidraw.md").is_file());
    }

    #[test]
    fn dir_store_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        assert!(matches!(
            store.read("nope.md"),
            Err(StorageError::NotFound { ref path }) if path == "nope.md"
        ));
    }

    #[test]
    fn dir_store_refuses_to_leave_its_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::new(dir.path());
        assert!(matches!(
            store.write("../outside.md", "x"),
            Err(StorageError::InvalidPath { .. })
        ));
        assert!(matches!(
            store.read("/etc/passwd"),
            Err(StorageError::InvalidPath { .. })
        ));
    }
}
