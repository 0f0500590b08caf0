//! Error types for phasegate operations.
//!
//! Only failures that prevent a verdict from being produced are errors.
//! Compliance failures themselves are [`Violation`](crate::core::Violation)
//! values returned to the caller, and collaborator failures are logged and
//! degraded rather than propagated.
//!
//! # Categories
//!
//! - `Io`: filesystem failures while reading configuration or schemas
//! - `Config`: invalid or missing `.phasegate.toml` content
//! - `AllowList`: the allow-list document could not be loaded
//! - `PhaseSchema`: the phase definition table failed load-time validation
//! - `UnknownPhase`: a phase id that is not part of the schema
//! - `Parser`: a tree-sitter grammar could not be initialised
//! - `Collaborator`: an external collaborator (test runner, issue reporter) failed

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for phasegate operations
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// File system errors with path context
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Config error: {message}{}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Allow-list document errors
    #[error("Allow-list error in {}: {message}", path.display())]
    AllowList { path: PathBuf, message: String },

    /// Phase schema validation errors
    #[error("Phase schema error: {0}")]
    PhaseSchema(String),

    /// Lookup of a phase that is not in the schema
    #[error("Unknown phase: {0}")]
    UnknownPhase(String),

    /// Grammar initialisation errors
    #[error("Parser error: {0}")]
    Parser(String),

    /// External collaborator failures
    #[error("{name} failed: {message}")]
    Collaborator { name: String, message: String },

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl ComplianceError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error without a file
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with file context
    pub fn config_with_path(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create an allow-list error
    pub fn allow_list(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::AllowList {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a phase schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::PhaseSchema(message.into())
    }

    /// Create a collaborator error
    pub fn collaborator(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "I/O",
            Self::Config { .. } | Self::Toml(_) => "Config",
            Self::AllowList { .. } => "AllowList",
            Self::PhaseSchema(_) | Self::UnknownPhase(_) => "Schema",
            Self::Parser(_) => "Parse",
            Self::Collaborator { .. } => "Collaborator",
            Self::Json(_) => "JSON",
        }
    }

    /// Configuration-class errors abort a check before any verdict exists.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::Toml(_)
                | Self::AllowList { .. }
                | Self::PhaseSchema(_)
                | Self::UnknownPhase(_)
        )
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, ComplianceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display_includes_path() {
        let err = ComplianceError::config_with_path("bad threshold", "/tmp/.phasegate.toml");
        let rendered = err.to_string();
        assert!(rendered.contains("bad threshold"));
        assert!(rendered.contains("/tmp/.phasegate.toml"));
        assert_eq!(err.category(), "Config");
    }

    #[test]
    fn test_config_error_without_path() {
        let err = ComplianceError::config("missing field");
        assert_eq!(err.to_string(), "Config error: missing field");
    }

    #[test]
    fn test_configuration_classification() {
        assert!(ComplianceError::schema("cycle").is_configuration_error());
        assert!(ComplianceError::UnknownPhase("x".into()).is_configuration_error());
        assert!(!ComplianceError::collaborator("gh", "not found").is_configuration_error());
    }
}
