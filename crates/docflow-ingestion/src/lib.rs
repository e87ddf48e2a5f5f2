//! Upload intake and the extract → chunk → embed → index pipeline.
//!
//! This crate provides:
//! - Text extractors for plain text, Markdown, and JSON content
//! - A fixed-size, paragraph-aware text chunker with overlap
//! - A staged ingestion pipeline that turns an uploaded document into
//!   indexed chunk embeddings

pub mod chunking;
pub mod extractors;
pub mod pipeline;

pub use chunking::{Chunk, ChunkingConfig, TextChunker};
pub use extractors::{
    ExtractionResult, ExtractorRegistry, JsonExtractor, MarkdownExtractor, PlainTextExtractor,
    TextExtractor,
};
pub use pipeline::{IngestionPipeline, IngestionResult, PipelineConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Invalid chunking configuration: {0}")]
    InvalidConfig(String),

    #[error("Document too large: {size} bytes (max {max})")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Index error: {0}")]
    Index(#[from] docflow_index::IndexError),

    #[error("Store error: {0}")]
    Store(#[from] docflow_core::CoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IngestionError>;
