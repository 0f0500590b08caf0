//! Entry points called by hosts: may this edit happen, may this commit
//! happen, and where does the workflow stand.

use crate::allowlist::{check_allow_list_document, AllowList, DependencyValidator};
use crate::collaborators::{
    CommandTestRunner, DefaultFileClassifier, FileClass, FileClassifier, GhIssueReporter,
    IssueReporter, NullIssueReporter, TestRunReport, TestRunner,
};
use crate::complexity::ComplexityAnalyzer;
use crate::config::ComplianceConfig;
use crate::core::{has_critical, Severity, Violation, ViolationKind};
use crate::errors::Result;
use crate::io::FileSystem;
use crate::phases::{PhaseGraph, PhaseSchema, PhaseVerdict, WorkflowStatus};
use crate::tdd::{is_source_unit, TddGuard, UnitVerdict};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EditOperation {
    Create,
    Modify,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EditVerdict {
    pub allowed: bool,
    pub class: FileClass,
    pub violations: Vec<Violation>,
}

impl EditVerdict {
    fn allow(class: FileClass) -> Self {
        Self {
            allowed: true,
            class,
            violations: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CommitVerdict {
    pub passed: bool,
    pub violations: Vec<Violation>,
    /// `None` when coverage was unavailable.
    pub coverage_percent: Option<f64>,
}

pub struct ComplianceOrchestrator {
    config: ComplianceConfig,
    fs: Arc<dyn FileSystem>,
    phases: PhaseGraph,
    tdd: TddGuard,
    classifier: Box<dyn FileClassifier>,
    runner: Box<dyn TestRunner>,
    reporter: Box<dyn IssueReporter>,
}

impl ComplianceOrchestrator {
    pub fn new(
        config: ComplianceConfig,
        schema: Arc<PhaseSchema>,
        fs: Arc<dyn FileSystem>,
        classifier: Box<dyn FileClassifier>,
        runner: Box<dyn TestRunner>,
        reporter: Box<dyn IssueReporter>,
    ) -> Self {
        let allow_list_file = allow_list_file(&config, &schema);
        let phases = PhaseGraph::new(
            schema,
            Arc::clone(&fs),
            config.design_docs_dir(),
            config.project_name.clone(),
        )
        .with_completion_threshold(config.thresholds.completion_threshold)
        .with_allow_list_file(allow_list_file)
        .with_allow_list_check(config.hooks.technology_lock_enforcement);

        let tdd = TddGuard::new(
            Arc::clone(&fs),
            config.project_root.clone(),
            ComplexityAnalyzer::new(config.thresholds.complexity()),
        );

        Self {
            config,
            fs,
            phases,
            tdd,
            classifier,
            runner,
            reporter,
        }
    }

    /// Production wiring: schema from `phases_file` or the embedded table,
    /// the default classifier, the command test runner, and `gh` issues
    /// unless reporting is disabled.
    pub fn from_config(config: ComplianceConfig, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let schema = match &config.phases_file {
            Some(path) => PhaseSchema::load(fs.as_ref(), &config.resolve(path))?,
            None => PhaseSchema::embedded()?,
        };
        let schema = Arc::new(schema);

        let classifier = DefaultFileClassifier::new(Arc::clone(&schema), allow_list_file(&config, &schema));
        let runner = CommandTestRunner::from_config(Arc::clone(&fs), &config);
        let reporter: Box<dyn IssueReporter> = if config.issues.enabled && config.hooks.auto_issue_creation {
            Box::new(GhIssueReporter::new(
                config.issues.labels.clone(),
                config.project_root.clone(),
            ))
        } else {
            Box::new(NullIssueReporter)
        };

        Ok(Self::new(
            config,
            schema,
            fs,
            Box::new(classifier),
            Box::new(runner),
            reporter,
        ))
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    pub fn phases(&self) -> &PhaseGraph {
        &self.phases
    }

    pub fn tdd(&self) -> &TddGuard {
        &self.tdd
    }

    pub fn classify(&self, path: &Path) -> FileClass {
        self.classifier.classify(path)
    }

    pub fn check_edit(&self, path: &Path, operation: EditOperation) -> Result<EditVerdict> {
        let class = self.classifier.classify(path);
        tracing::debug!(path = %path.display(), ?class, ?operation, "Checking edit");

        match &class {
            FileClass::SourceUnit => {
                if !self.config.hooks.tdd_guard_enabled
                    || operation != EditOperation::Create
                    || self.tdd.has_corresponding_test(path)
                {
                    return Ok(EditVerdict::allow(class));
                }
                Ok(EditVerdict {
                    allowed: false,
                    class,
                    violations: vec![TddGuard::missing_tests_violation(path)
                        .with_remediation("Write a failing test first, then the implementation")],
                })
            }
            FileClass::PhaseArtifact { phase } => {
                if !self.config.hooks.workflow_enforcement {
                    return Ok(EditVerdict::allow(class));
                }
                let readiness = self.phases.readiness(phase)?;
                Ok(EditVerdict {
                    allowed: readiness.passed,
                    violations: readiness.violations,
                    class,
                })
            }
            FileClass::Neither => Ok(EditVerdict::allow(class)),
        }
    }

    pub fn can_edit(&self, path: &Path, operation: EditOperation) -> Result<bool> {
        Ok(self.check_edit(path, operation)?.allowed)
    }

    /// Test-first checks on one unit's current text.
    pub fn validate_unit(&self, path: &Path, text: &str) -> UnitVerdict {
        if !self.config.hooks.tdd_guard_enabled {
            return UnitVerdict {
                compliant: true,
                violations: Vec::new(),
            };
        }
        self.tdd.validate_unit(path, text)
    }

    pub fn can_commit(&self, changed: &[PathBuf]) -> Result<CommitVerdict> {
        let _span = tracing::info_span!("can_commit", changed = changed.len()).entered();

        if !self.config.hooks.quality_gates {
            tracing::info!("Quality gates disabled");
            return Ok(CommitVerdict {
                passed: true,
                ..CommitVerdict::default()
            });
        }

        let mut violations = Vec::new();
        if self.config.hooks.tdd_guard_enabled {
            violations.extend(self.changed_unit_violations(changed));
        }
        if self.config.hooks.technology_lock_enforcement {
            violations.extend(self.allow_list_commit_check());
            violations.extend(self.changed_dependency_violations(changed));
        }

        let mut coverage_percent = None;
        let mut coverage_below = false;
        match self.runner.run() {
            Ok(report) => {
                coverage_percent = report.coverage_percent;
                coverage_below = coverage_percent.is_some_and(|c| c < self.config.thresholds.min_coverage);
                violations.extend(self.test_run_violations(&report));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Test runner unavailable; skipping test and coverage gates");
            }
        }

        let passed = !has_critical(&violations) && !coverage_below;
        tracing::info!(passed, violations = violations.len(), "Commit check complete");

        if !passed {
            self.forward_to_reporter("Commit blocked by compliance violations", &violations);
        }

        Ok(CommitVerdict {
            passed,
            violations,
            coverage_percent,
        })
    }

    /// Text of a project file through the orchestrator's filesystem.
    /// `None` when it is missing or unreadable.
    pub fn read_project_file(&self, path: &Path) -> Option<String> {
        let resolved = self.config.resolve(path);
        match self.fs.read_to_string(&resolved) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!(path = %resolved.display(), error = %e, "Skipping unreadable project file");
                None
            }
        }
    }

    fn changed_unit_violations(&self, changed: &[PathBuf]) -> Vec<Violation> {
        changed
            .iter()
            .filter(|path| is_source_unit(path))
            .filter_map(|path| {
                self.read_project_file(path)
                    .map(|text| self.tdd.validate_unit(path, &text).violations)
            })
            .flatten()
            .collect()
    }

    /// An existing allow-list must be well-formed; a malformed one blocks.
    fn allow_list_commit_check(&self) -> Vec<Violation> {
        let path = self.phases.allow_list_path();
        if !self.fs.exists(&path) {
            return Vec::new();
        }
        check_allow_list_document(self.fs.as_ref(), &path, self.phases.schema().allow_list_owner())
            .into_iter()
            .map(|v| {
                if v.kind == ViolationKind::InvalidAllowList {
                    Violation::new(v.subject, v.kind, Severity::Critical, v.description)
                        .with_remediation(format!("Fix {} before committing", path.display()))
                } else {
                    v
                }
            })
            .collect()
    }

    fn changed_dependency_violations(&self, changed: &[PathBuf]) -> Vec<Violation> {
        let validator = match self.dependency_validator() {
            Ok(validator) => validator,
            Err(e) => {
                tracing::debug!(error = %e, "No usable allow-list; skipping dependency validation");
                return Vec::new();
            }
        };
        changed
            .iter()
            .filter_map(|path| {
                self.read_project_file(path)
                    .map(|text| validator.validate_file(path, &text))
            })
            .flatten()
            .collect()
    }

    fn dependency_validator(&self) -> Result<DependencyValidator> {
        let allow_list = AllowList::load(self.fs.as_ref(), &self.phases.allow_list_path())?;
        Ok(DependencyValidator::new(allow_list, self.config.hooks.strict_mode))
    }

    /// Dependency validation for explicit files. A missing or malformed
    /// allow-list is a configuration error here.
    pub fn validate_dependencies(&self, files: &[PathBuf]) -> Result<Vec<Violation>> {
        let validator = self.dependency_validator()?;
        Ok(files
            .iter()
            .filter_map(|path| {
                self.read_project_file(path)
                    .map(|text| validator.validate_file(path, &text))
            })
            .flatten()
            .collect())
    }

    fn test_run_violations(&self, report: &TestRunReport) -> Vec<Violation> {
        let min = self.config.thresholds.min_coverage;
        let mut violations = Vec::new();

        if !report.passed {
            violations.push(
                Violation::new(
                    "test-suite",
                    ViolationKind::FailingTests,
                    Severity::Critical,
                    "Test suite is failing",
                )
                .with_remediation("Fix failing tests before committing"),
            );
        }
        if let Some(coverage) = report.coverage_percent.filter(|c| *c < min) {
            violations.push(
                Violation::new(
                    "test-suite",
                    ViolationKind::LowCoverage,
                    Severity::High,
                    format!("Test coverage is {coverage:.1}% (required: {min}%)"),
                )
                .with_remediation(format!("Add tests to increase coverage above {min}%")),
            );
        }
        for file in &report.per_file {
            violations.push(
                Violation::new(
                    file.path.display().to_string(),
                    ViolationKind::FileLowCoverage,
                    Severity::Medium,
                    format!("File has {:.1}% coverage", file.percent),
                )
                .with_remediation(format!("Add tests for {}", file.path.display())),
            );
        }
        violations
    }

    pub fn status(&self) -> Result<WorkflowStatus> {
        self.phases.overall_status()
    }

    pub fn check_agent_readiness(&self, phase: &str) -> Result<PhaseVerdict> {
        if !self.config.hooks.workflow_enforcement {
            self.phases.schema().require(phase)?;
            return Ok(PhaseVerdict {
                passed: true,
                violations: Vec::new(),
            });
        }
        self.phases.readiness(phase)
    }

    pub fn validate_phase_completion(&self, ordinal: u32) -> PhaseVerdict {
        self.phases.validate_phase_completion(ordinal)
    }

    /// Critical and high readiness violations across every phase, forwarded
    /// to the issue reporter when there are any.
    pub fn report_workflow_violations(&self) -> Result<Vec<Violation>> {
        if !self.config.hooks.workflow_enforcement {
            return Ok(Vec::new());
        }

        let mut violations = Vec::new();
        for phase in &self.phases.schema().phases {
            let readiness = self.phases.readiness(&phase.id)?;
            violations.extend(
                readiness
                    .violations
                    .into_iter()
                    .filter(|v| v.severity.is_gating()),
            );
        }

        if !violations.is_empty() {
            self.forward_to_reporter("Workflow violations detected", &violations);
        }
        Ok(violations)
    }

    /// Fire-and-forget: reporter failures are logged, never propagated.
    fn forward_to_reporter(&self, title: &str, violations: &[Violation]) {
        if !self.config.hooks.auto_issue_creation {
            return;
        }
        if let Err(e) = self.reporter.report(title, violations) {
            tracing::warn!(error = %e, "Could not create compliance issue");
        }
    }
}

fn allow_list_file(config: &ComplianceConfig, schema: &PhaseSchema) -> String {
    config
        .allow_list_file
        .clone()
        .unwrap_or_else(|| schema.allow_list_file.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{FileCoverage, StaticTestRunner};
    use crate::errors::ComplianceError;
    use crate::io::MemoryFileSystem;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingReporter {
        calls: Arc<Mutex<Vec<(String, usize)>>>,
        fail: bool,
    }

    impl IssueReporter for RecordingReporter {
        fn report(&self, title: &str, violations: &[Violation]) -> Result<()> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((title.to_string(), violations.len()));
            }
            if self.fail {
                Err(ComplianceError::collaborator("issue reporter", "offline"))
            } else {
                Ok(())
            }
        }
    }

    struct FailingRunner;

    impl TestRunner for FailingRunner {
        fn run(&self) -> Result<TestRunReport> {
            Err(ComplianceError::collaborator("test runner", "pytest missing"))
        }
    }

    fn config() -> ComplianceConfig {
        ComplianceConfig::default().anchored_at(Path::new("/proj"))
    }

    fn orchestrator(
        fs: &MemoryFileSystem,
        config: ComplianceConfig,
        runner: Box<dyn TestRunner>,
        reporter: RecordingReporter,
    ) -> ComplianceOrchestrator {
        let schema = Arc::new(PhaseSchema::embedded().unwrap());
        let classifier = DefaultFileClassifier::new(Arc::clone(&schema), "technology-lock.json");
        ComplianceOrchestrator::new(
            config,
            schema,
            Arc::new(fs.clone()),
            Box::new(classifier),
            runner,
            Box::new(reporter),
        )
    }

    fn passing(fs: &MemoryFileSystem) -> ComplianceOrchestrator {
        orchestrator(
            fs,
            config(),
            Box::new(StaticTestRunner::passing(95.0)),
            RecordingReporter::default(),
        )
    }

    #[test]
    fn test_create_source_requires_test_first() {
        let fs = MemoryFileSystem::new();
        let o = passing(&fs);
        let verdict = o.check_edit(Path::new("src/cart.py"), EditOperation::Create).unwrap();
        assert!(!verdict.allowed);
        assert_eq!(verdict.class, FileClass::SourceUnit);
        assert_eq!(verdict.violations[0].kind, ViolationKind::MissingTests);

        assert!(o.can_edit(Path::new("src/cart.py"), EditOperation::Modify).unwrap());

        fs.add_file("/proj/./tests/test_cart.py", "");
        assert!(o.can_edit(Path::new("src/cart.py"), EditOperation::Create).unwrap());
    }

    #[test]
    fn test_create_unit_unblocked_by_same_extension_test() {
        let fs = MemoryFileSystem::new();
        let o = passing(&fs);
        assert!(!o.can_edit(Path::new("cmd/main.go"), EditOperation::Create).unwrap());
        assert!(!o.can_edit(Path::new("web/util.mjs"), EditOperation::Create).unwrap());

        fs.add_file("/proj/./cmd/main_test.go", "package main\n");
        fs.add_file("/proj/./web/util.test.mjs", "");
        let verdict = o.check_edit(Path::new("cmd/main.go"), EditOperation::Create).unwrap();
        assert_eq!(verdict.class, FileClass::SourceUnit);
        assert!(verdict.allowed, "{:?}", verdict.violations);
        assert!(o.can_edit(Path::new("web/util.mjs"), EditOperation::Create).unwrap());
    }

    #[test]
    fn test_artifact_edit_follows_readiness() {
        let fs = MemoryFileSystem::new();
        let o = passing(&fs);
        let verdict = o
            .check_edit(Path::new("docs/design/ux_design.md"), EditOperation::Modify)
            .unwrap();
        assert!(!verdict.allowed);
        assert!(verdict
            .violations
            .iter()
            .all(|v| v.kind == ViolationKind::MissingDependency));

        assert!(o
            .can_edit(Path::new("docs/design/product_requirements.md"), EditOperation::Create)
            .unwrap());
    }

    #[test]
    fn test_disabled_hooks_short_circuit() {
        let fs = MemoryFileSystem::new();
        let mut cfg = config();
        cfg.hooks.tdd_guard_enabled = false;
        cfg.hooks.workflow_enforcement = false;
        let o = orchestrator(
            &fs,
            cfg,
            Box::new(StaticTestRunner::passing(95.0)),
            RecordingReporter::default(),
        );
        assert!(o.can_edit(Path::new("src/cart.py"), EditOperation::Create).unwrap());
        assert!(o.can_edit(Path::new("docs/design/ux_design.md"), EditOperation::Create).unwrap());
        assert!(o.check_agent_readiness("senior-coder").unwrap().passed);
        assert!(o.check_agent_readiness("nobody").is_err());
    }

    #[test]
    fn test_commit_blocks_on_missing_tests_and_reports() {
        let fs = MemoryFileSystem::new().with_file("/proj/./src/cart.py", "def total():\n    return 0\n");
        let reporter = RecordingReporter::default();
        let o = orchestrator(
            &fs,
            config(),
            Box::new(StaticTestRunner::passing(95.0)),
            reporter.clone(),
        );

        let verdict = o.can_commit(&[PathBuf::from("src/cart.py")]).unwrap();
        assert!(!verdict.passed);
        assert!(verdict.violations.iter().any(|v| v.kind == ViolationKind::MissingTests));
        assert_eq!(reporter.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_commit_low_coverage_blocks_without_critical() {
        let fs = MemoryFileSystem::new();
        let runner = StaticTestRunner::new(TestRunReport {
            passed: true,
            coverage_percent: Some(72.5),
            per_file: vec![FileCoverage {
                path: PathBuf::from("src/cart.py"),
                percent: 40.0,
            }],
        });
        let o = orchestrator(&fs, config(), Box::new(runner), RecordingReporter::default());

        let verdict = o.can_commit(&[]).unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.coverage_percent, Some(72.5));
        let kinds: Vec<_> = verdict.violations.iter().map(|v| v.kind).collect();
        assert_eq!(kinds, vec![ViolationKind::LowCoverage, ViolationKind::FileLowCoverage]);
        assert!(verdict.violations[0].description.contains("72.5%"));
    }

    #[test]
    fn test_commit_failing_tests_is_critical() {
        let fs = MemoryFileSystem::new();
        let runner = StaticTestRunner::new(TestRunReport {
            passed: false,
            coverage_percent: Some(95.0),
            per_file: Vec::new(),
        });
        let o = orchestrator(&fs, config(), Box::new(runner), RecordingReporter::default());
        let verdict = o.can_commit(&[]).unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.violations[0].kind, ViolationKind::FailingTests);
    }

    #[test]
    fn test_runner_failure_skips_gates() {
        let fs = MemoryFileSystem::new();
        let o = orchestrator(&fs, config(), Box::new(FailingRunner), RecordingReporter::default());
        let verdict = o.can_commit(&[]).unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.coverage_percent, None);
    }

    #[test]
    fn test_reporter_failure_is_not_propagated() {
        let fs = MemoryFileSystem::new();
        let reporter = RecordingReporter {
            fail: true,
            ..Default::default()
        };
        let runner = StaticTestRunner::new(TestRunReport {
            passed: false,
            ..Default::default()
        });
        let o = orchestrator(&fs, config(), Box::new(runner), reporter.clone());
        let verdict = o.can_commit(&[]).unwrap();
        assert!(!verdict.passed);
        assert_eq!(reporter.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_allow_list_blocks_commit() {
        let fs = MemoryFileSystem::new().with_file("/proj/./docs/design/technology-lock.json", "{oops");
        let verdict = passing(&fs).can_commit(&[]).unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.violations[0].kind, ViolationKind::InvalidAllowList);
        assert_eq!(verdict.violations[0].severity, Severity::Critical);
    }

    #[test]
    fn test_unapproved_dependency_in_changed_file() {
        let fs = MemoryFileSystem::new()
            .with_file(
                "/proj/./docs/design/technology-lock.json",
                r#"{"frontend": ["react"], "backend": [], "database": [], "deployment": []}"#,
            )
            .with_file("/proj/./web/package.json", r#"{"dependencies": {"react": "^18", "lodash": "^4"}}"#);
        let verdict = passing(&fs).can_commit(&[PathBuf::from("web/package.json")]).unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.violations.len(), 1);
        assert_eq!(verdict.violations[0].kind, ViolationKind::UnauthorizedDependency);
        assert!(verdict.violations[0].description.contains("lodash"));
    }

    #[test]
    fn test_quality_gates_disabled() {
        let fs = MemoryFileSystem::new().with_file("/proj/./src/cart.py", "x = 1\n");
        let mut cfg = config();
        cfg.hooks.quality_gates = false;
        let o = orchestrator(&fs, cfg, Box::new(FailingRunner), RecordingReporter::default());
        assert!(o.can_commit(&[PathBuf::from("src/cart.py")]).unwrap().passed);
    }

    #[test]
    fn test_report_workflow_violations_forwards_gating_only() {
        let fs = MemoryFileSystem::new();
        let reporter = RecordingReporter::default();
        let o = orchestrator(
            &fs,
            config(),
            Box::new(StaticTestRunner::passing(95.0)),
            reporter.clone(),
        );
        let violations = o.report_workflow_violations().unwrap();
        assert!(!violations.is_empty());
        assert!(violations.iter().all(|v| v.severity.is_gating()));
        assert_eq!(reporter.calls.lock().unwrap()[0].0, "Workflow violations detected");
    }
}
