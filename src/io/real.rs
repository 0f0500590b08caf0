//! Production implementation of [`FileSystem`] backed by `std::fs`.

use crate::errors::{ComplianceError, Result};
use crate::io::traits::FileSystem;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Production file system implementation.
///
/// Stateless; it delegates directly to `std::fs` so concurrent invocations
/// see whatever snapshot the OS gives them.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| ComplianceError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}
