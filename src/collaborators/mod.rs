//! Boundaries to the world outside the engine: deciding what kind of file a
//! path is, running the test suite, and filing issues.
//!
//! The orchestrator only sees these traits. Production wiring uses
//! [`DefaultFileClassifier`], [`CommandTestRunner`] and [`GhIssueReporter`].

pub mod classifier;
pub mod coverage;
pub mod issues;
pub mod runner;

pub use classifier::{is_test_file, DefaultFileClassifier};
pub use coverage::{parse_coverage_json, parse_lcov, CoverageSummary, FileCoverage};
pub use issues::{GhIssueReporter, NullIssueReporter};
pub use runner::{CommandTestRunner, StaticTestRunner};

use crate::core::Violation;
use crate::errors::Result;
use serde::Serialize;
use std::path::Path;

/// What the engine does with a file, decided once per path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum FileClass {
    SourceUnit,
    PhaseArtifact { phase: String },
    Neither,
}

pub trait FileClassifier: Send + Sync {
    fn classify(&self, path: &Path) -> FileClass;
}

/// Facts from one test run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TestRunReport {
    pub passed: bool,
    /// Total coverage percentage; `None` when no report was available.
    pub coverage_percent: Option<f64>,
    pub per_file: Vec<FileCoverage>,
}

pub trait TestRunner: Send + Sync {
    fn run(&self) -> Result<TestRunReport>;
}

pub trait IssueReporter: Send + Sync {
    fn report(&self, title: &str, violations: &[Violation]) -> Result<()>;
}
