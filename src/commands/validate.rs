use super::{print_json, print_outcome, print_violations};
use crate::cli::OutputFormat;
use crate::collaborators::FileClass;
use crate::core::{dedup_violations, has_critical, Violation};
use crate::orchestrator::{ComplianceOrchestrator, EditOperation};
use crate::report::render_violation_guidance;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct FileValidation<'a> {
    path: &'a Path,
    class: FileClass,
    allowed: bool,
    /// `None` when the unit was not validated (not a source unit, or absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    compliant: Option<bool>,
    passed: bool,
    violations: Vec<Violation>,
}

/// Edit gate for `path`, plus the test-first checks on its current text
/// when it is an existing source unit.
fn check_file<'a>(
    orchestrator: &ComplianceOrchestrator,
    path: &'a Path,
    operation: EditOperation,
) -> Result<FileValidation<'a>> {
    let edit = orchestrator.check_edit(path, operation)?;

    let unit = match edit.class {
        FileClass::SourceUnit => orchestrator
            .read_project_file(path)
            .map(|text| orchestrator.validate_unit(path, &text)),
        _ => None,
    };

    let compliant = unit.as_ref().map(|u| u.compliant);
    let unit_violations = unit.map(|u| u.violations).unwrap_or_default();
    Ok(FileValidation {
        path,
        class: edit.class,
        allowed: edit.allowed,
        compliant,
        passed: edit.allowed && compliant.unwrap_or(true),
        violations: dedup_violations(edit.violations.into_iter().chain(unit_violations)),
    })
}

pub fn validate_file(
    orchestrator: &ComplianceOrchestrator,
    path: &Path,
    operation: EditOperation,
    format: OutputFormat,
) -> Result<bool> {
    let validation = check_file(orchestrator, path, operation)?;
    let passed = validation.passed;

    match format {
        OutputFormat::Json => print_json(&validation)?,
        OutputFormat::Text => {
            print_outcome(passed, &format!("{} ({operation:?})", path.display()));
            if !validation.violations.is_empty() {
                println!();
                print!("{}", render_violation_guidance(&validation.violations));
            }
        }
    }
    Ok(passed)
}

pub fn validate_commit(
    orchestrator: &ComplianceOrchestrator,
    changed: &[PathBuf],
    format: OutputFormat,
) -> Result<bool> {
    let verdict = orchestrator.can_commit(changed)?;

    match format {
        OutputFormat::Json => print_json(&verdict)?,
        OutputFormat::Text => {
            print_outcome(verdict.passed, "commit");
            match verdict.coverage_percent {
                Some(coverage) => println!("  coverage: {coverage:.1}%"),
                None => println!("  coverage: unknown"),
            }
            print_violations(&verdict.violations);
        }
    }
    Ok(verdict.passed)
}

pub fn validate_deps(
    orchestrator: &ComplianceOrchestrator,
    files: &[PathBuf],
    format: OutputFormat,
) -> Result<bool> {
    let violations = orchestrator.validate_dependencies(files)?;
    let passed = !has_critical(&violations);

    match format {
        OutputFormat::Json => print_json(&violations)?,
        OutputFormat::Text => {
            print_outcome(passed, &format!("dependencies in {} file(s)", files.len()));
            print_violations(&violations);
        }
    }
    Ok(passed)
}
