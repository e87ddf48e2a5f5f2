//! Workflow selection and execution.
//!
//! A workflow is a static, ordered list of processing steps applied to a
//! document. Execution is strictly sequential; every completed step is
//! journaled before the next one starts, so partial results survive a
//! failure and re-running an execution resumes where it left off.

pub mod definitions;
pub mod executor;
pub mod handlers;
pub mod step;

pub use definitions::{select_workflow, WorkflowDefinition, WorkflowRegistry};
pub use executor::{ExecutionState, ExecutionStatus, WorkflowExecutor};
pub use handlers::{
    AnalyzeContentHandler, ExtractTextHandler, HandlerSet, SendNotificationHandler, StepContext,
    StepHandler, StoreDataHandler,
};
pub use step::{RetryPolicy, StepKind, StepSpec};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Unknown workflow: {0}")]
    UnknownWorkflow(String),

    #[error("Invalid workflow definition: {0}")]
    InvalidDefinition(String),

    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("No handler registered for step kind {0:?}")]
    NoHandler(step::StepKind),

    #[error("Step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] docflow_core::CoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
