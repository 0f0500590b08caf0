//! The phase workflow: a loadable, validated definition table and the
//! evaluator that derives status and readiness from artifact documents.

pub mod evaluator;
pub mod schema;

pub use evaluator::{
    NextAction, PhaseGraph, PhaseState, PhaseStatus, PhaseVerdict, WorkflowStatus,
    DEFAULT_COMPLETION_THRESHOLD,
};
pub use schema::{PhaseDefinition, PhaseSchema};
