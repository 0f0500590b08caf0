// Export modules for library usage
pub mod allowlist;
pub mod cli;
pub mod collaborators;
pub mod commands;
pub mod complexity;
pub mod config;
pub mod core;
pub mod document;
pub mod errors;
pub mod io;
pub mod orchestrator;
pub mod parsing;
pub mod phases;
pub mod report;
pub mod tdd;

// Re-export commonly used types
pub use crate::core::{has_critical, Language, Severity, Violation, ViolationKind};

pub use crate::errors::{ComplianceError, Result};

pub use crate::allowlist::{check_allow_list_document, AllowList, DependencyValidator};

pub use crate::complexity::{ComplexityAnalyzer, ComplexityMetric, ComplexityThresholds};

pub use crate::config::{discover_config, ComplianceConfig, LoadedConfig};

pub use crate::io::{FileSystem, MemoryFileSystem, RealFileSystem};

pub use crate::orchestrator::{
    CommitVerdict, ComplianceOrchestrator, EditOperation, EditVerdict,
};

pub use crate::phases::{
    NextAction, PhaseGraph, PhaseSchema, PhaseState, PhaseStatus, PhaseVerdict, WorkflowStatus,
};

pub use crate::tdd::{TddGuard, UnitVerdict};
