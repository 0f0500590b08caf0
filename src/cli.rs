use crate::orchestrator::EditOperation;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored text
    Text,
    /// JSON document on stdout
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "phasegate")]
#[command(about = "Workflow, test-first and dependency compliance gates", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: search for .phasegate.toml upwards)
    #[arg(long, global = true, env = "PHASEGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root, overriding the configured one
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether a file may be created or modified, and validate its content
    ValidateFile {
        /// File to check
        path: PathBuf,

        /// Kind of edit about to happen
        #[arg(long, value_enum, default_value = "modify")]
        operation: EditOperation,
    },

    /// Run the commit gates over the changed files
    ValidateCommit {
        /// Changed files, relative to the project root
        changed: Vec<PathBuf>,
    },

    /// Show workflow progress and the next action
    Status,

    /// Check whether a phase's prerequisites are met
    CheckReadiness {
        /// Phase id, e.g. `solution-architect`
        phase: String,
    },

    /// Check that every phase at an ordinal has a complete artifact
    ValidatePhase {
        ordinal: u32,
    },

    /// Check declared dependencies against the allow-list
    ValidateDeps {
        /// Source files or manifests (package.json, requirements.txt)
        files: Vec<PathBuf>,
    },

    /// Print the markdown compliance report
    Report {
        /// File workflow violations as an issue as well
        #[arg(long)]
        file_issue: bool,
    },

    /// Write a default .phasegate.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
