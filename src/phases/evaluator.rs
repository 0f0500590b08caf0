//! Per-phase status, readiness and overall workflow progress.
//!
//! Nothing here is cached: every call reads the artifacts again, so the
//! answer always reflects the filesystem at call time.

use super::schema::{PhaseDefinition, PhaseSchema};
use crate::allowlist::check_allow_list_document;
use crate::core::{Severity, Violation, ViolationKind};
use crate::document;
use crate::errors::Result;
use crate::io::FileSystem;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_COMPLETION_THRESHOLD: f64 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    NotStarted,
    /// Artifact exists but could not be read as text.
    ArtifactPresentUnscored,
    ScoredIncomplete,
    ScoredComplete,
}

impl PhaseState {
    pub fn is_complete(&self) -> bool {
        matches!(self, PhaseState::ScoredComplete)
    }

    pub fn is_started(&self) -> bool {
        !matches!(self, PhaseState::NotStarted)
    }
}

/// Snapshot of one phase, derived from its artifact.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhaseStatus {
    pub id: String,
    pub ordinal: u32,
    pub artifact_path: PathBuf,
    pub artifact_exists: bool,
    /// Fraction of required sections present; 0 when absent or unreadable.
    pub completeness: f64,
    pub state: PhaseState,
    pub dependencies_satisfied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Pass/fail plus the violations behind it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PhaseVerdict {
    pub passed: bool,
    pub violations: Vec<Violation>,
}

impl PhaseVerdict {
    fn from_gating(violations: Vec<Violation>) -> Self {
        Self {
            passed: !violations.iter().any(Violation::blocks_readiness),
            violations,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NextAction {
    Execute { phase: String },
    ResolveBlockingIssues { phase: String },
}

impl NextAction {
    pub fn phase(&self) -> &str {
        match self {
            NextAction::Execute { phase } | NextAction::ResolveBlockingIssues { phase } => phase,
        }
    }
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextAction::Execute { phase } => write!(f, "execute {phase}"),
            NextAction::ResolveBlockingIssues { phase } => {
                write!(f, "resolve blocking issues for {phase}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkflowStatus {
    pub project_name: String,
    /// Highest ordinal among complete phases, 0 when none.
    pub current_phase: u32,
    pub completion_percentage: f64,
    pub phases: Vec<PhaseStatus>,
    pub next_action: Option<NextAction>,
    pub blocking_issues: Vec<Violation>,
    pub ready_for_downstream: bool,
}

pub struct PhaseGraph {
    schema: Arc<PhaseSchema>,
    fs: Arc<dyn FileSystem>,
    project_name: String,
    artifact_dir: PathBuf,
    completion_threshold: f64,
    allow_list_file: String,
    check_allow_list: bool,
}

impl PhaseGraph {
    /// Artifacts live in `{design_docs_root}/{project_name}/`, or directly in
    /// the docs root when the project name is empty.
    pub fn new(
        schema: Arc<PhaseSchema>,
        fs: Arc<dyn FileSystem>,
        design_docs_root: impl AsRef<Path>,
        project_name: impl Into<String>,
    ) -> Self {
        let project_name = project_name.into();
        let root = design_docs_root.as_ref();
        let artifact_dir = if project_name.is_empty() {
            root.to_path_buf()
        } else {
            root.join(&project_name)
        };
        let allow_list_file = schema.allow_list_file.clone();

        Self {
            schema,
            fs,
            project_name,
            artifact_dir,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            allow_list_file,
            check_allow_list: true,
        }
    }

    pub fn with_completion_threshold(mut self, threshold: f64) -> Self {
        self.completion_threshold = threshold;
        self
    }

    pub fn with_allow_list_file(mut self, file_name: impl Into<String>) -> Self {
        self.allow_list_file = file_name.into();
        self
    }

    /// Toggle the allow-list side check for dependency-sensitive phases.
    pub fn with_allow_list_check(mut self, enabled: bool) -> Self {
        self.check_allow_list = enabled;
        self
    }

    pub fn schema(&self) -> &PhaseSchema {
        &self.schema
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn artifact_path(&self, phase: &PhaseDefinition) -> PathBuf {
        self.artifact_dir.join(&phase.output_file)
    }

    pub fn allow_list_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.allow_list_file)
    }

    /// Artifact facts only; dependency satisfaction is filled in by callers.
    fn artifact_status(&self, phase: &PhaseDefinition) -> PhaseStatus {
        let artifact_path = self.artifact_path(phase);
        let artifact_exists = self.fs.is_file(&artifact_path);

        let (completeness, state) = if !artifact_exists {
            (0.0, PhaseState::NotStarted)
        } else {
            match self.fs.read_to_string(&artifact_path) {
                Ok(content) => {
                    let score = document::score(&content, &phase.required_sections);
                    let state = if score >= self.completion_threshold {
                        PhaseState::ScoredComplete
                    } else {
                        PhaseState::ScoredIncomplete
                    };
                    (score, state)
                }
                Err(e) => {
                    tracing::warn!(
                        phase = %phase.id,
                        path = %artifact_path.display(),
                        error = %e,
                        "Artifact present but unreadable"
                    );
                    (0.0, PhaseState::ArtifactPresentUnscored)
                }
            }
        };

        let last_modified = artifact_exists
            .then(|| self.fs.modified(&artifact_path))
            .flatten()
            .map(DateTime::<Utc>::from);

        PhaseStatus {
            id: phase.id.clone(),
            ordinal: phase.ordinal,
            artifact_path,
            artifact_exists,
            completeness,
            state,
            dependencies_satisfied: false,
            last_modified,
        }
    }

    fn deps_satisfied(&self, phase: &PhaseDefinition) -> bool {
        phase.depends_on.iter().all(|dep| {
            self.schema
                .get(dep)
                .is_some_and(|def| self.artifact_status(def).state.is_complete())
        })
    }

    pub fn status_of(&self, id: &str) -> Result<PhaseStatus> {
        let phase = self.schema.require(id)?;
        let mut status = self.artifact_status(phase);
        status.dependencies_satisfied = self.deps_satisfied(phase);
        Ok(status)
    }

    /// True iff every prerequisite is scored complete.
    pub fn dependencies_satisfied(&self, id: &str) -> Result<bool> {
        let phase = self.schema.require(id)?;
        Ok(self.deps_satisfied(phase))
    }

    pub fn readiness(&self, id: &str) -> Result<PhaseVerdict> {
        let phase = self.schema.require(id)?;
        let mut violations = Vec::new();

        for dep_id in &phase.depends_on {
            let dep = self.schema.require(dep_id)?;
            let dep_status = self.artifact_status(dep);
            match dep_status.state {
                PhaseState::ScoredComplete => {}
                PhaseState::NotStarted => violations.push(
                    Violation::new(
                        &phase.id,
                        ViolationKind::MissingDependency,
                        Severity::Critical,
                        format!("Dependency '{dep_id}' has not completed"),
                    )
                    .with_remediation(self.upstream_remediation(dep))
                    .with_remediation("Ensure output document is generated"),
                ),
                PhaseState::ArtifactPresentUnscored | PhaseState::ScoredIncomplete => violations.push(
                    Violation::new(
                        &phase.id,
                        ViolationKind::IncompleteDependency,
                        Severity::High,
                        format!(
                            "Dependency '{dep_id}' document is incomplete ({:.1}%)",
                            dep_status.completeness * 100.0
                        ),
                    )
                    .with_remediation(format!(
                        "Complete all required sections in {}",
                        dep_status.artifact_path.display()
                    )),
                ),
            }
        }

        if phase.requires_allow_list && self.check_allow_list {
            violations.extend(check_allow_list_document(
                self.fs.as_ref(),
                &self.allow_list_path(),
                self.schema.allow_list_owner(),
            ));
        }

        let verdict = PhaseVerdict::from_gating(violations);
        tracing::debug!(phase = id, ready = verdict.passed, "Evaluated readiness");
        Ok(verdict)
    }

    /// Artifact checks for every phase at `ordinal`.
    pub fn validate_phase_completion(&self, ordinal: u32) -> PhaseVerdict {
        let phases = self.schema.at_ordinal(ordinal);
        if phases.is_empty() {
            return PhaseVerdict {
                passed: false,
                violations: vec![Violation::new(
                    "workflow",
                    ViolationKind::InvalidPhase,
                    Severity::Critical,
                    format!("Phase {ordinal} does not exist"),
                )],
            };
        }

        let violations: Vec<Violation> = phases
            .into_iter()
            .filter_map(|phase| self.completion_violation(&self.artifact_status(phase)))
            .collect();

        PhaseVerdict {
            passed: violations.is_empty(),
            violations,
        }
    }

    fn completion_violation(&self, status: &PhaseStatus) -> Option<Violation> {
        match status.state {
            PhaseState::ScoredComplete => None,
            PhaseState::NotStarted => Some(
                Violation::new(
                    &status.id,
                    ViolationKind::IncompleteArtifact,
                    Severity::Critical,
                    "Phase has not generated its output document",
                )
                .with_remediation(format!("Create {}", status.artifact_path.display())),
            ),
            PhaseState::ArtifactPresentUnscored | PhaseState::ScoredIncomplete => {
                let missing = self.missing_sections(status);
                let remediation = if missing.is_empty() {
                    format!(
                        "Complete all required sections in {}",
                        status.artifact_path.display()
                    )
                } else {
                    format!(
                        "Add the missing sections to {}: {}",
                        status.artifact_path.display(),
                        missing.join(", ")
                    )
                };
                Some(
                    Violation::new(
                        &status.id,
                        ViolationKind::IncompleteDocument,
                        Severity::High,
                        format!("Document only {:.1}% complete", status.completeness * 100.0),
                    )
                    .with_remediation(remediation),
                )
            }
        }
    }

    /// Required sections absent from the phase's artifact. Empty when the
    /// artifact cannot be read.
    fn missing_sections(&self, status: &PhaseStatus) -> Vec<String> {
        let Some(phase) = self.schema.get(&status.id) else {
            return Vec::new();
        };
        match self.fs.read_to_string(&status.artifact_path) {
            Ok(content) => document::missing_sections(&content, &phase.required_sections)
                .into_iter()
                .map(str::to_string)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// "Execute" step for an unfinished dependency, naming every incomplete
    /// phase upstream of it in ordinal order.
    fn upstream_remediation(&self, dep: &PhaseDefinition) -> String {
        let mut pending: Vec<&PhaseDefinition> = self
            .schema
            .transitive_dependencies(&dep.id)
            .into_iter()
            .filter_map(|id| self.schema.get(id))
            .filter(|phase| !self.artifact_status(phase).state.is_complete())
            .collect();
        if pending.is_empty() {
            return format!("Execute {} first", dep.id);
        }
        pending.push(dep);
        pending.sort_by_key(|phase| phase.ordinal);
        let order: Vec<&str> = pending.iter().map(|phase| phase.id.as_str()).collect();
        format!("Execute phases in order: {}", order.join(", "))
    }

    pub fn overall_status(&self) -> Result<WorkflowStatus> {
        let _span = tracing::info_span!("overall_status", project = %self.project_name).entered();

        let mut phases: Vec<PhaseStatus> = self
            .schema
            .phases
            .iter()
            .map(|phase| self.artifact_status(phase))
            .collect();
        for (status, def) in phases.iter_mut().zip(&self.schema.phases) {
            status.dependencies_satisfied = self.deps_satisfied(def);
        }

        let complete: Vec<&PhaseStatus> = phases.iter().filter(|s| s.state.is_complete()).collect();
        let completion_percentage = 100.0 * complete.len() as f64 / phases.len() as f64;
        let current_phase = complete.iter().map(|s| s.ordinal).max().unwrap_or(0);
        let ready_for_downstream = phases
            .iter()
            .filter(|s| s.ordinal <= self.schema.design_boundary)
            .all(|s| s.state.is_complete());

        let mut next_action = None;
        let mut blocking_issues = Vec::new();
        if let Some(pending) = phases.iter().find(|s| !s.state.is_complete()) {
            let readiness = self.readiness(&pending.id)?;
            blocking_issues.extend(readiness.violations.into_iter().filter(|v| v.blocking));

            next_action = Some(if !pending.state.is_started() && readiness.passed {
                NextAction::Execute {
                    phase: pending.id.clone(),
                }
            } else {
                blocking_issues.extend(self.completion_violation(pending).filter(|_| pending.state.is_started()));
                NextAction::ResolveBlockingIssues {
                    phase: pending.id.clone(),
                }
            });
        }

        tracing::info!(
            completion = completion_percentage,
            current_phase,
            blocking = blocking_issues.len(),
            "Computed workflow status"
        );

        Ok(WorkflowStatus {
            project_name: self.project_name.clone(),
            current_phase,
            completion_percentage,
            phases,
            next_action,
            blocking_issues,
            ready_for_downstream,
        })
    }
}
