use super::{print_json, print_outcome, print_violations};
use crate::cli::OutputFormat;
use crate::orchestrator::ComplianceOrchestrator;
use crate::phases::PhaseState;
use crate::report::render_compliance_report;
use anyhow::Result;
use colored::Colorize;

pub fn status(orchestrator: &ComplianceOrchestrator, format: OutputFormat) -> Result<bool> {
    let status = orchestrator.status()?;
    let passed = status.blocking_issues.is_empty();

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Text => {
            let project = if status.project_name.is_empty() {
                "default"
            } else {
                status.project_name.as_str()
            };
            println!("Project: {}", project.bold());
            println!("Progress: {:.1}%", status.completion_percentage);
            println!("Current phase: {}", status.current_phase);
            match &status.next_action {
                Some(action) => println!("Next action: {}", action.to_string().cyan()),
                None => println!("Next action: {}", "all phases complete".green()),
            }
            println!();
            for phase in &status.phases {
                let marker = match phase.state {
                    PhaseState::ScoredComplete => "done".green(),
                    PhaseState::NotStarted => "todo".dimmed(),
                    PhaseState::ArtifactPresentUnscored | PhaseState::ScoredIncomplete => {
                        "wip ".yellow()
                    }
                };
                println!(
                    "  {marker} {:>2}. {:<26} {:>5.1}%",
                    phase.ordinal,
                    phase.id,
                    phase.completeness * 100.0
                );
            }
            if !status.blocking_issues.is_empty() {
                println!("\nBlocking issues:");
                print_violations(&status.blocking_issues);
            }
        }
    }
    Ok(passed)
}

pub fn check_readiness(
    orchestrator: &ComplianceOrchestrator,
    phase: &str,
    format: OutputFormat,
) -> Result<bool> {
    let verdict = orchestrator.check_agent_readiness(phase)?;

    match format {
        OutputFormat::Json => print_json(&verdict)?,
        OutputFormat::Text => {
            print_outcome(verdict.passed, &format!("{phase} readiness"));
            print_violations(&verdict.violations);
        }
    }
    Ok(verdict.passed)
}

pub fn validate_phase(
    orchestrator: &ComplianceOrchestrator,
    ordinal: u32,
    format: OutputFormat,
) -> Result<bool> {
    let verdict = orchestrator.validate_phase_completion(ordinal);

    match format {
        OutputFormat::Json => print_json(&verdict)?,
        OutputFormat::Text => {
            print_outcome(verdict.passed, &format!("phase {ordinal}"));
            print_violations(&verdict.violations);
        }
    }
    Ok(verdict.passed)
}

pub fn report(
    orchestrator: &ComplianceOrchestrator,
    file_issue: bool,
    format: OutputFormat,
) -> Result<bool> {
    let status = orchestrator.status()?;

    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Text => print!("{}", render_compliance_report(&status)),
    }

    if file_issue {
        let filed = orchestrator.report_workflow_violations()?;
        tracing::info!(violations = filed.len(), "Forwarded workflow violations");
    }
    Ok(true)
}
