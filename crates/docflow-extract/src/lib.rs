//! Entity extraction with model fallback.
//!
//! Extraction runs a transformer NER model over windowed text when the
//! input looks model-friendly, falls back to a table of regex patterns
//! when it does not (or when the model call fails), and merges both
//! result sets with span-overlap deduplication.

pub mod entities;
pub mod extractor;
pub mod model;
pub mod patterns;
pub mod risk;

pub use entities::{Entity, EntityKind, EntitySource};
pub use extractor::{EntityExtractor, ExtractionOutcome, ExtractorConfig};
pub use model::{HttpNerClient, ModelSpan, NerModel};
pub use patterns::extract_with_patterns;
pub use risk::failure_risk;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Model request failed: {0}")]
    ModelFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
