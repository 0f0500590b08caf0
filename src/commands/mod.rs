//! Subcommand handlers behind the `phasegate` binary.
//!
//! Each handler prints its result and returns whether the gate passed; the
//! binary turns `false` into exit status 1.

pub mod init;
pub mod validate;
pub mod workflow;

use crate::cli::{Cli, Commands};
use crate::config::{discover_config, load_config_from_path, LoadedConfig};
use crate::core::{Severity, Violation};
use crate::io::RealFileSystem;
use crate::orchestrator::ComplianceOrchestrator;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Load configuration for this invocation, honouring `--config` and
/// `--project`.
pub fn load_configuration(cli: &Cli, cwd: &Path) -> Result<LoadedConfig> {
    let mut loaded = match &cli.config {
        Some(path) => load_config_from_path(&cwd.join(path))
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => discover_config(cwd).context("Failed to load configuration")?,
    };
    if let Some(project) = &cli.project {
        loaded.config.project_root = cwd.join(project);
    }
    Ok(loaded)
}

pub fn run(cli: &Cli) -> Result<bool> {
    if let Commands::Init { force } = &cli.command {
        let dir = match &cli.project {
            Some(project) => project.clone(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        init::init_config(&dir, *force)?;
        return Ok(true);
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let loaded = load_configuration(cli, &cwd)?;
    if let Some(source) = &loaded.source {
        tracing::info!(config = %source.display(), "Using configuration file");
    }

    let orchestrator =
        ComplianceOrchestrator::from_config(loaded.config, Arc::new(RealFileSystem::new()))
            .context("Failed to initialise compliance checks")?;
    let format = cli.format;

    match &cli.command {
        Commands::ValidateFile { path, operation } => {
            validate::validate_file(&orchestrator, path, *operation, format)
        }
        Commands::ValidateCommit { changed } => {
            validate::validate_commit(&orchestrator, changed, format)
        }
        Commands::ValidateDeps { files } => validate::validate_deps(&orchestrator, files, format),
        Commands::Status => workflow::status(&orchestrator, format),
        Commands::CheckReadiness { phase } => {
            workflow::check_readiness(&orchestrator, phase, format)
        }
        Commands::ValidatePhase { ordinal } => {
            workflow::validate_phase(&orchestrator, *ordinal, format)
        }
        Commands::Report { file_issue } => workflow::report(&orchestrator, *file_issue, format),
        Commands::Init { .. } => Ok(true),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise result")?;
    println!("{json}");
    Ok(())
}

pub(crate) fn print_outcome(passed: bool, subject: &str) {
    if passed {
        println!("{} {subject}", "PASS".green().bold());
    } else {
        println!("{} {subject}", "BLOCKED".red().bold());
    }
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    let label = format!("{:>8}", severity.to_string());
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.dimmed(),
    }
}

pub(crate) fn print_violations(violations: &[Violation]) {
    for v in violations {
        let location = v.line.map(|line| format!(":{line}")).unwrap_or_default();
        println!(
            "  {} {}{} {}",
            severity_label(v.severity),
            v.subject.bold(),
            location,
            v.description
        );
        for step in &v.remediation {
            println!("           {} {step}", "->".dimmed());
        }
    }
}
