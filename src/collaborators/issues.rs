use super::IssueReporter;
use crate::core::Violation;
use crate::errors::{ComplianceError, Result};
use crate::report::render_issue_body;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Files violations as a GitHub issue through the `gh` CLI.
pub struct GhIssueReporter {
    labels: Vec<String>,
    working_dir: PathBuf,
}

impl GhIssueReporter {
    pub fn new(labels: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            labels,
            working_dir: working_dir.into(),
        }
    }

    fn issue_args(&self, title: &str, body: &str) -> Vec<String> {
        let mut args = vec![
            "issue".to_string(),
            "create".to_string(),
            "--title".to_string(),
            title.to_string(),
            "--body".to_string(),
            body.to_string(),
        ];
        for label in &self.labels {
            args.push("--label".to_string());
            args.push(label.clone());
        }
        args
    }
}

impl IssueReporter for GhIssueReporter {
    fn report(&self, title: &str, violations: &[Violation]) -> Result<()> {
        let gh = which::which("gh")
            .map_err(|e| ComplianceError::collaborator("issue reporter", format!("gh not found in PATH: {e}")))?;

        let body = render_issue_body(title, violations);
        let output = Command::new(gh)
            .args(self.issue_args(title, &body))
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ComplianceError::collaborator("issue reporter", e.to_string()))?;

        if !output.status.success() {
            return Err(ComplianceError::collaborator(
                "issue reporter",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        tracing::info!(
            url = %String::from_utf8_lossy(&output.stdout).trim(),
            violations = violations.len(),
            "Created compliance issue"
        );
        Ok(())
    }
}

/// Drops every report. Used when issue creation is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullIssueReporter;

impl IssueReporter for NullIssueReporter {
    fn report(&self, title: &str, violations: &[Violation]) -> Result<()> {
        tracing::debug!(title, violations = violations.len(), "Issue reporting disabled");
        Ok(())
    }
}
