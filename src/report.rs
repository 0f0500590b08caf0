//! Markdown renderings of verdicts for humans and issue trackers.

use crate::core::{count_by_severity, Severity, Violation};
use crate::phases::{PhaseState, WorkflowStatus};
use chrono::Utc;
use std::fmt::Write;

fn title_case(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn state_marker(state: PhaseState) -> &'static str {
    match state {
        PhaseState::ScoredComplete => "[x]",
        PhaseState::NotStarted => "[ ]",
        PhaseState::ArtifactPresentUnscored | PhaseState::ScoredIncomplete => "[~]",
    }
}

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "CRITICAL",
        Severity::High => "HIGH",
        Severity::Medium => "MEDIUM",
        Severity::Low => "LOW",
    }
}

/// Non-zero severity counts, most severe first, e.g. `1 critical, 2 high`.
fn severity_breakdown(violations: &[Violation]) -> String {
    [Severity::Critical, Severity::High, Severity::Medium, Severity::Low]
        .into_iter()
        .map(|severity| (count_by_severity(violations, severity), severity))
        .filter(|(count, _)| *count > 0)
        .map(|(count, severity)| format!("{count} {severity}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Full workflow report: per-phase status, blockers, next action and
/// downstream readiness.
pub fn render_compliance_report(status: &WorkflowStatus) -> String {
    let mut out = String::new();
    let project = if status.project_name.is_empty() {
        "Unknown"
    } else {
        status.project_name.as_str()
    };

    let _ = writeln!(out, "# Workflow Compliance Report");
    let _ = writeln!(out, "**Project:** {project}");
    let _ = writeln!(out, "**Generated:** {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "**Overall Progress:** {:.1}%", status.completion_percentage);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Phase Status Overview");
    let _ = writeln!(out);

    for phase in &status.phases {
        let score = if phase.artifact_exists {
            format!("{:.1}%", phase.completeness * 100.0)
        } else {
            "N/A".to_string()
        };
        let _ = writeln!(
            out,
            "{} **{}** (Phase {})",
            state_marker(phase.state),
            title_case(&phase.id),
            phase.ordinal
        );
        let _ = writeln!(out, "   - Artifact: {}", phase.artifact_path.display());
        let _ = writeln!(out, "   - Completeness: {score}");
        let _ = writeln!(out, "   - Dependencies Met: {}", phase.dependencies_satisfied);
        if let Some(modified) = phase.last_modified {
            let _ = writeln!(out, "   - Last Modified: {}", modified.format("%Y-%m-%d %H:%M"));
        }
        let _ = writeln!(out);
    }

    if !status.blocking_issues.is_empty() {
        let _ = writeln!(out, "## Blocking Issues");
        let _ = writeln!(out);
        for issue in &status.blocking_issues {
            let _ = writeln!(out, "- {}", issue.summary());
        }
        let _ = writeln!(out);
    }

    if let Some(action) = &status.next_action {
        let _ = writeln!(out, "## Next Action Required");
        let _ = writeln!(out, "{action}");
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Downstream Readiness");
    let _ = writeln!(
        out,
        "{}",
        if status.ready_for_downstream {
            "Ready for implementation"
        } else {
            "Design phase incomplete"
        }
    );
    out
}

/// Numbered violations with remediation, followed by the test-first cycle.
pub fn render_violation_guidance(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "All compliance checks passed.\n".to_string();
    }

    let mut out = format!(
        "Compliance violations found ({}):\n\n",
        severity_breakdown(violations)
    );
    for (index, violation) in violations.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. [{}] {}",
            index + 1,
            severity_marker(violation.severity),
            violation.kind.as_str().to_uppercase()
        );
        let _ = writeln!(out, "   Subject: {}", violation.subject);
        if let Some(line) = violation.line {
            let _ = writeln!(out, "   Line: {line}");
        }
        let _ = writeln!(out, "   Issue: {}", violation.description);
        for step in &violation.remediation {
            let _ = writeln!(out, "   Fix: {step}");
        }
        let _ = writeln!(out);
    }

    out.push_str("Test-first cycle:\n");
    out.push_str("1. RED: Write a failing test first\n");
    out.push_str("2. GREEN: Write minimal code to pass the test\n");
    out.push_str("3. REFACTOR: Clean up code while keeping tests green\n");
    out
}

/// Issue body for a batch of violations.
pub fn render_issue_body(title: &str, violations: &[Violation]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {title}");
    let _ = writeln!(out);
    let _ = writeln!(out, "**Detected:** {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        out,
        "**Violations:** {} ({})",
        violations.len(),
        severity_breakdown(violations)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "| Severity | Kind | Subject | Description |");
    let _ = writeln!(out, "|---|---|---|---|");
    for v in violations {
        let _ = writeln!(
            out,
            "| {} | {} | `{}` | {} |",
            v.severity,
            v.kind,
            v.subject,
            v.description.replace('|', "\\|")
        );
    }

    let steps: Vec<&String> = violations.iter().flat_map(|v| v.remediation.iter()).collect();
    if !steps.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Resolution Steps");
        for step in steps {
            let _ = writeln!(out, "- [ ] {step}");
        }
    }
    out
}
