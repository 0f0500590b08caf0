use super::coverage::{is_lcov_path, parse_coverage_json, parse_lcov, CoverageSummary};
use super::{TestRunReport, TestRunner};
use crate::config::ComplianceConfig;
use crate::errors::{ComplianceError, Result};
use crate::io::FileSystem;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

const DEFAULT_COVERAGE_REPORT: &str = "coverage.json";

/// Runs the configured test command, then reads the coverage report it left
/// behind.
///
/// Without a command the suite is taken as passing and only the report is
/// read. A missing report leaves coverage unknown.
pub struct CommandTestRunner {
    fs: Arc<dyn FileSystem>,
    command: Option<Vec<String>>,
    coverage_report: PathBuf,
    working_dir: PathBuf,
    min_file_coverage: f64,
}

impl CommandTestRunner {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        command: Option<Vec<String>>,
        coverage_report: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            command,
            coverage_report: coverage_report.into(),
            working_dir: working_dir.into(),
            min_file_coverage: 90.0,
        }
    }

    pub fn from_config(fs: Arc<dyn FileSystem>, config: &ComplianceConfig) -> Self {
        let report = config
            .test_runner
            .coverage_report
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COVERAGE_REPORT));
        Self::new(
            fs,
            config.test_runner.command.clone(),
            config.resolve(&report),
            config.project_root.clone(),
        )
        .with_min_file_coverage(config.thresholds.min_coverage)
    }

    pub fn with_min_file_coverage(mut self, threshold: f64) -> Self {
        self.min_file_coverage = threshold;
        self
    }

    fn run_command(&self, argv: &[String]) -> Result<bool> {
        let Some((program, args)) = argv.split_first() else {
            return Err(ComplianceError::collaborator("test runner", "empty test command"));
        };

        tracing::info!(command = %argv.join(" "), "Running test suite");
        let output = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ComplianceError::collaborator("test runner", format!("failed to start {program}: {e}")))?;

        if !output.status.success() {
            tracing::debug!(
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Test command failed"
            );
        }
        Ok(output.status.success())
    }

    fn read_coverage(&self) -> Result<Option<CoverageSummary>> {
        if !self.fs.is_file(&self.coverage_report) {
            tracing::warn!(path = %self.coverage_report.display(), "Coverage report not found");
            return Ok(None);
        }
        let contents = self.fs.read_to_string(&self.coverage_report)?;
        let summary = if is_lcov_path(&self.coverage_report) {
            parse_lcov(&contents)?
        } else {
            parse_coverage_json(&contents)?
        };
        Ok(Some(summary))
    }
}

impl TestRunner for CommandTestRunner {
    fn run(&self) -> Result<TestRunReport> {
        let passed = match &self.command {
            Some(argv) => self.run_command(argv)?,
            None => true,
        };

        let coverage = self.read_coverage()?;
        Ok(TestRunReport {
            passed,
            coverage_percent: coverage.as_ref().map(|c| c.total_percent),
            per_file: coverage
                .map(|c| c.files_below(self.min_file_coverage))
                .unwrap_or_default(),
        })
    }
}

/// Returns a fixed report. For embedding hosts that run tests themselves.
#[derive(Clone, Debug, Default)]
pub struct StaticTestRunner {
    report: TestRunReport,
}

impl StaticTestRunner {
    pub fn new(report: TestRunReport) -> Self {
        Self { report }
    }

    pub fn passing(coverage_percent: f64) -> Self {
        Self::new(TestRunReport {
            passed: true,
            coverage_percent: Some(coverage_percent),
            per_file: Vec::new(),
        })
    }
}

impl TestRunner for StaticTestRunner {
    fn run(&self) -> Result<TestRunReport> {
        Ok(self.report.clone())
    }
}
