//! Shared data model: the uniform [`Violation`] record every analyzer emits,
//! and the [`Language`] enumeration used to pick an analysis strategy.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Critical and high violations are the ones that can block a phase.
    pub fn is_gating(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Severity, &str)] = &[
            (Severity::Low, "low"),
            (Severity::Medium, "medium"),
            (Severity::High, "high"),
            (Severity::Critical, "critical"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(s, _)| s == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    // TDD
    MissingTests,
    OverImplementation,
    HighComplexity,
    SyntaxError,
    UntestedFunction,
    FailingTests,
    LowCoverage,
    FileLowCoverage,
    // Workflow
    MissingDependency,
    IncompleteDependency,
    InvalidPhase,
    IncompleteArtifact,
    IncompleteDocument,
    // Allow-list
    MissingAllowList,
    InvalidAllowList,
    IncompleteAllowList,
    UnauthorizedDependency,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::MissingTests => "missing_tests",
            ViolationKind::OverImplementation => "over_implementation",
            ViolationKind::HighComplexity => "high_complexity",
            ViolationKind::SyntaxError => "syntax_error",
            ViolationKind::UntestedFunction => "untested_function",
            ViolationKind::FailingTests => "failing_tests",
            ViolationKind::LowCoverage => "low_coverage",
            ViolationKind::FileLowCoverage => "file_low_coverage",
            ViolationKind::MissingDependency => "missing_dependency",
            ViolationKind::IncompleteDependency => "incomplete_dependency",
            ViolationKind::InvalidPhase => "invalid_phase",
            ViolationKind::IncompleteArtifact => "incomplete_artifact",
            ViolationKind::IncompleteDocument => "incomplete_document",
            ViolationKind::MissingAllowList => "missing_allow_list",
            ViolationKind::InvalidAllowList => "invalid_allow_list",
            ViolationKind::IncompleteAllowList => "incomplete_allow_list",
            ViolationKind::UnauthorizedDependency => "unauthorized_dependency",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected compliance failure.
///
/// `subject` is a file path for source-level findings and a phase id for
/// workflow findings. Violations are built once by an analyzer and never
/// mutated afterwards; the builder methods consume `self`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    pub subject: String,
    pub kind: ViolationKind,
    pub description: String,
    pub severity: Severity,
    pub blocking: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediation: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Violation {
    pub fn new(
        subject: impl Into<String>,
        kind: ViolationKind,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            kind,
            description: description.into(),
            severity,
            blocking: true,
            remediation: Vec::new(),
            line: None,
        }
    }

    pub fn non_blocking(mut self) -> Self {
        self.blocking = false;
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_remediation(mut self, step: impl Into<String>) -> Self {
        self.remediation.push(step.into());
        self
    }

    /// Blocking and critical/high: the condition phase readiness checks on.
    pub fn blocks_readiness(&self) -> bool {
        self.blocking && self.severity.is_gating()
    }

    /// `subject: description`, the form used in blocking-issue summaries.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.subject, self.description)
    }
}

pub fn has_critical(violations: &[Violation]) -> bool {
    violations.iter().any(|v| v.severity == Severity::Critical)
}

/// Drop repeats of the same kind of violation on the same subject and line,
/// keeping the first occurrence.
pub fn dedup_violations(violations: impl IntoIterator<Item = Violation>) -> Vec<Violation> {
    let mut seen = std::collections::HashSet::new();
    violations
        .into_iter()
        .filter(|v| seen.insert((v.kind, v.subject.clone(), v.line)))
        .collect()
}

pub fn count_by_severity(violations: &[Violation], severity: Severity) -> usize {
    violations.iter().filter(|v| v.severity == severity).count()
}

/// Source ecosystems the analyzers understand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        static EXTENSION_MAP: &[(&[&str], Language)] = &[
            (&["py", "pyw"], Language::Python),
            (&["js", "jsx", "mjs", "cjs"], Language::JavaScript),
            (&["ts", "tsx", "mts", "cts"], Language::TypeScript),
        ];

        EXTENSION_MAP
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, lang)| *lang)
            .unwrap_or(Language::Unknown)
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Language, &str)] = &[
            (Language::Python, "Python"),
            (Language::JavaScript, "JavaScript"),
            (Language::TypeScript, "TypeScript"),
            (Language::Unknown, "Unknown"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(l, _)| l == self)
            .map(|(_, s)| *s)
            .unwrap_or("Unknown");

        write!(f, "{display_str}")
    }
}
