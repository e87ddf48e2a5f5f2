//! Staged ingestion pipeline: extract → chunk → embed → index.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use docflow_core::{DocumentId, DocumentRecord};
use docflow_index::{ChunkRecord, EmbeddingProvider, VectorStore};

use crate::chunking::{ChunkingConfig, TextChunker};
use crate::extractors::ExtractorRegistry;
use crate::{IngestionError, Result};

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Maximum document size in bytes
    pub max_document_bytes: usize,
    /// Number of chunks embedded per batch request
    pub embed_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            max_document_bytes: 50 * 1024 * 1024,
            embed_batch_size: 32,
        }
    }
}

/// Result of running a document through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResult {
    /// Document that was processed
    pub document_id: DocumentId,
    /// Number of chunks indexed
    pub chunk_count: usize,
    /// Characters of text extracted
    pub text_length: usize,
    /// Extraction metadata
    pub extraction_metadata: HashMap<String, serde_json::Value>,
    /// Processing duration in milliseconds
    pub processing_time_ms: u64,
    /// Warnings collected along the way
    pub warnings: Vec<String>,
}

/// Turns an uploaded document into indexed chunk embeddings.
pub struct IngestionPipeline {
    config: PipelineConfig,
    extractors: ExtractorRegistry,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: VectorStore,
}

impl IngestionPipeline {
    pub fn new(
        config: PipelineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: VectorStore,
    ) -> Result<Self> {
        let chunker = TextChunker::new(config.chunking.clone())?;
        Ok(Self {
            config,
            extractors: ExtractorRegistry::with_defaults(),
            chunker,
            embedder,
            index,
        })
    }

    /// Run the full pipeline for a document.
    ///
    /// Stage failures surface as errors; the caller decides what that means
    /// for document status.
    pub async fn ingest(&self, record: &DocumentRecord, content: &[u8]) -> Result<IngestionResult> {
        let start = std::time::Instant::now();
        let mut warnings = Vec::new();

        if content.len() > self.config.max_document_bytes {
            return Err(IngestionError::DocumentTooLarge {
                size: content.len(),
                max: self.config.max_document_bytes,
            });
        }

        // Extraction
        let extractor = self.extractors.for_content_type(&record.content_type);
        let extraction = extractor.extract(content).await?;
        warnings.extend(extraction.warnings.iter().cloned());

        if extraction.text.trim().is_empty() {
            warnings.push("no text extracted".to_string());
        }

        // Chunking
        let chunks = self.chunker.chunk(record.id, &extraction.text);
        if chunks.is_empty() && !extraction.text.trim().is_empty() {
            warn!(document_id = %record.id, "Text produced no chunks");
            warnings.push("text produced no chunks".to_string());
        }

        // Embedding + indexing, in batches
        let mut chunk_count = 0;
        for batch in chunks.chunks(self.config.embed_batch_size.max(1)) {
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            let records: Vec<ChunkRecord> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| ChunkRecord {
                    id: chunk.id,
                    document_id: chunk.document_id,
                    text: chunk.content.clone(),
                    chunk_index: chunk.index,
                    embedding,
                    metadata: HashMap::new(),
                })
                .collect();

            chunk_count += records.len();
            self.index.upsert_chunks(records).await?;
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            document_id = %record.id,
            chunk_count,
            processing_time_ms,
            extractor = %extractor.name(),
            "Document ingested"
        );

        Ok(IngestionResult {
            document_id: record.id,
            chunk_count,
            text_length: extraction.text.chars().count(),
            extraction_metadata: extraction.metadata,
            processing_time_ms,
            warnings,
        })
    }
}
