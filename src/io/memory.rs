//! In-memory [`FileSystem`] for fast, isolated tests.
//!
//! ```rust
//! use phasegate::io::{FileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new()
//!     .with_file("docs/design/product_requirements.md", "## Scope");
//!
//! assert!(fs.exists(Path::new("docs/design")));
//! assert!(fs.read_to_string(Path::new("docs/design/product_requirements.md")).is_ok());
//! ```

use crate::errors::{ComplianceError, Result};
use crate::io::traits::FileSystem;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

#[derive(Debug, Clone)]
enum Entry {
    Text(String),
    /// Present on disk but not readable as UTF-8 text.
    Unreadable,
}

/// Thread-safe in-memory file tree. Directories are implied by file paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, (Entry, SystemTime)>>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryFileSystem::add_file`].
    pub fn with_file(self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Insert or overwrite a text file.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.insert(path.as_ref(), Entry::Text(content.into()));
    }

    /// Insert a file that exists but cannot be read as text.
    pub fn add_unreadable_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), Entry::Unreadable);
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        if let Ok(mut files) = self.files.write() {
            files.remove(path.as_ref());
        }
    }

    fn insert(&self, path: &Path, entry: Entry) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.to_path_buf(), (entry, SystemTime::now()));
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self
            .files
            .read()
            .map_err(|_| ComplianceError::io(path, std::io::Error::other("lock poisoned")))?;
        match files.get(path) {
            Some((Entry::Text(content), _)) => Ok(content.clone()),
            Some((Entry::Unreadable, _)) => Err(ComplianceError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"),
            )),
            None => Err(ComplianceError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            )),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(path))
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .read()
            .map(|files| {
                files
                    .keys()
                    .any(|file| file != path && file.starts_with(path))
            })
            .unwrap_or(false)
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.files
            .read()
            .ok()
            .and_then(|files| files.get(path).map(|(_, time)| *time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_are_implied() {
        let fs = MemoryFileSystem::new().with_file("a/b/c.py", "x = 1");
        assert!(fs.is_dir(Path::new("a")));
        assert!(fs.is_dir(Path::new("a/b")));
        assert!(!fs.is_dir(Path::new("a/b/c.py")));
        assert!(fs.is_file(Path::new("a/b/c.py")));
    }

    #[test]
    fn test_unreadable_file_exists_but_fails_to_read() {
        let fs = MemoryFileSystem::new();
        fs.add_unreadable_file("doc.md");
        assert!(fs.exists(Path::new("doc.md")));
        assert!(fs.read_to_string(Path::new("doc.md")).is_err());
    }

    #[test]
    fn test_remove_file() {
        let fs = MemoryFileSystem::new().with_file("x.md", "");
        fs.remove_file("x.md");
        assert!(!fs.exists(Path::new("x.md")));
    }
}
