//! Embeddings and vector similarity search.
//!
//! This crate provides:
//! - An [`EmbeddingProvider`] trait with an HTTP client for OpenAI-style
//!   embedding endpoints and a deterministic offline provider
//! - An in-memory [`VectorStore`] with exact cosine top-k search
//!
//! Dimension mismatches and zero-magnitude vectors are hard errors rather
//! than silent zero scores, so indexing bugs surface at the call site.

pub mod embedding;
pub mod store;

pub use embedding::{EmbeddingProvider, HashEmbeddingProvider, HttpEmbeddingClient};
pub use store::{ChunkRecord, SearchHit, VectorStore};

use thiserror::Error;

/// Embedding vector type.
pub type Embedding = Vec<f32>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    #[error("Embedding request failed: {0}")]
    EmbeddingFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;
