//! Core types and services shared across docflow crates.
//!
//! This crate provides:
//! - Strongly typed identifiers and the document data model
//! - Application configuration loaded from the environment
//! - An in-process event bus for processing lifecycle events
//! - Persistence traits (document store, step journal) with in-memory
//!   implementations

pub mod config;
pub mod events;
pub mod store;
pub mod types;

pub use config::{AppConfig, EmbeddingConfig, NerConfig, ServerConfig, SlackConfig};
pub use events::{Event, EventBus};
pub use store::{
    DocumentStore, InMemoryDocumentStore, InMemoryStepJournal, JournalEntry, StepJournal,
};
pub use types::{
    ChunkId, DocumentId, DocumentRecord, DocumentStatus, ExecutionId, WorkflowId,
};

use thiserror::Error;

/// Errors shared across docflow crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Invalid document state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
