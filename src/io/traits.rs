//! I/O trait definitions for compliance checks.
//!
//! The "pure core, imperative shell" split: scorers and analyzers work on
//! text, and everything that touches the disk goes through this trait so the
//! phase evaluator and TDD guard can be exercised against an in-memory tree.

use crate::errors::Result;
use std::path::Path;
use std::time::SystemTime;

/// Read-only file system operations.
///
/// Implementations must be `Send + Sync` so a host process can share one
/// instance between hook invocations.
pub trait FileSystem: Send + Sync {
    /// Read a file's contents as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns `ComplianceError::Io` if the file does not exist, cannot be
    /// read, or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Check if a path exists (file or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Last modification time, if the path exists and the platform reports one.
    fn modified(&self, path: &Path) -> Option<SystemTime>;
}
