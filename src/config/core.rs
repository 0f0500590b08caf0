use super::thresholds::ThresholdsConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration, read from `.phasegate.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    /// Sub-directory of the design docs root holding this project's
    /// artifacts. Empty means artifacts sit directly in the root.
    #[serde(default)]
    pub project_name: String,

    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Relative paths resolve against `project_root`.
    #[serde(default = "default_design_docs_root")]
    pub design_docs_root: PathBuf,

    /// Allow-list document name inside the artifact directory. Falls back to
    /// the phase schema's value.
    #[serde(default)]
    pub allow_list_file: Option<String>,

    /// External phase schema (TOML or JSON). Defaults to the embedded table.
    #[serde(default)]
    pub phases_file: Option<PathBuf>,

    #[serde(default)]
    pub hooks: HooksConfig,

    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    #[serde(default)]
    pub test_runner: TestRunnerConfig,

    #[serde(default)]
    pub issues: IssuesConfig,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            project_root: default_project_root(),
            design_docs_root: default_design_docs_root(),
            allow_list_file: None,
            phases_file: None,
            hooks: HooksConfig::default(),
            thresholds: ThresholdsConfig::default(),
            test_runner: TestRunnerConfig::default(),
            issues: IssuesConfig::default(),
        }
    }
}

impl ComplianceConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.thresholds.validate()?;
        if self.test_runner.command.as_ref().is_some_and(Vec::is_empty) {
            return Err("test_runner.command must not be empty".to_string());
        }
        Ok(())
    }

    /// Anchor a relative `project_root` at `base` (the config file's
    /// directory, or the working directory).
    pub fn anchored_at(mut self, base: &Path) -> Self {
        if self.project_root.is_relative() {
            self.project_root = base.join(&self.project_root);
        }
        self
    }

    pub fn design_docs_dir(&self) -> PathBuf {
        self.resolve(&self.design_docs_root)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Per-check switches. A disabled check always passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HooksConfig {
    #[serde(default = "enabled")]
    pub tdd_guard_enabled: bool,

    #[serde(default = "enabled")]
    pub workflow_enforcement: bool,

    #[serde(default = "enabled")]
    pub auto_issue_creation: bool,

    #[serde(default = "enabled")]
    pub quality_gates: bool,

    #[serde(default = "enabled")]
    pub technology_lock_enforcement: bool,

    /// Unapproved dependencies block when strict; otherwise they warn.
    #[serde(default = "enabled")]
    pub strict_mode: bool,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            tdd_guard_enabled: true,
            workflow_enforcement: true,
            auto_issue_creation: true,
            quality_gates: true,
            technology_lock_enforcement: true,
            strict_mode: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunnerConfig {
    /// argv of the test command, e.g. `["pytest", "--cov", "--cov-report=json"]`.
    #[serde(default)]
    pub command: Option<Vec<String>>,

    /// Coverage report to read after the run. `.info`/`.lcov` are LCOV,
    /// anything else is coverage.py JSON.
    #[serde(default)]
    pub coverage_report: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,

    #[serde(default = "default_issue_labels")]
    pub labels: Vec<String>,
}

impl Default for IssuesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            labels: default_issue_labels(),
        }
    }
}

fn enabled() -> bool {
    true
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_design_docs_root() -> PathBuf {
    PathBuf::from("docs/design")
}

fn default_issue_labels() -> Vec<String> {
    vec!["compliance".to_string(), "blocking".to_string()]
}
