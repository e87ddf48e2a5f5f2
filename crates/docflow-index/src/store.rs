//! In-memory vector store with exact cosine search.

use crate::{Embedding, IndexError, Result};
use docflow_core::{ChunkId, DocumentId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A chunk with its embedding, as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk identifier
    pub id: ChunkId,
    /// Owning document
    pub document_id: DocumentId,
    /// Chunk text
    pub text: String,
    /// Chunk index within the document
    pub chunk_index: usize,
    /// Embedding vector
    pub embedding: Embedding,
    /// Optional metadata (page number, section, ...)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: ChunkId,
    pub document_id: DocumentId,
    pub text: String,
    pub chunk_index: usize,
    pub score: f32,
}

/// Cosine similarity of two vectors.
///
/// Errors on dimension mismatch and on zero-magnitude input instead of
/// silently scoring 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(IndexError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(IndexError::InvalidVector(
            "cosine similarity undefined for zero-magnitude vector".to_string(),
        ));
    }

    Ok(dot / (norm_a * norm_b))
}

/// In-memory vector store.
///
/// Search is an exact scan over all chunks; results are deterministic for
/// identical query and contents.
#[derive(Clone, Default)]
pub struct VectorStore {
    chunks: Arc<RwLock<HashMap<ChunkId, ChunkRecord>>>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace chunk records.
    ///
    /// All embeddings in the batch must share one dimension.
    pub async fn upsert_chunks(&self, records: Vec<ChunkRecord>) -> Result<()> {
        if let Some(first) = records.first() {
            let dimension = first.embedding.len();
            for record in &records {
                if record.embedding.len() != dimension {
                    return Err(IndexError::DimensionMismatch {
                        expected: dimension,
                        actual: record.embedding.len(),
                    });
                }
            }
        }

        let mut chunks = self.chunks.write().await;
        for record in records {
            chunks.insert(record.id, record);
        }
        Ok(())
    }

    /// Remove every chunk belonging to a document. Returns the number removed.
    pub async fn delete_document(&self, document_id: DocumentId) -> usize {
        let mut chunks = self.chunks.write().await;
        let before = chunks.len();
        chunks.retain(|_, record| record.document_id != document_id);
        let removed = before - chunks.len();
        debug!(document_id = %document_id, removed, "Chunks removed from index");
        removed
    }

    /// Number of chunks in the index.
    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }

    /// Chunks for one document, ordered by chunk index.
    pub async fn document_chunks(&self, document_id: DocumentId) -> Vec<ChunkRecord> {
        let chunks = self.chunks.read().await;
        let mut records: Vec<_> = chunks
            .values()
            .filter(|record| record.document_id == document_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.chunk_index);
        records
    }

    /// Top-k cosine search.
    ///
    /// Results are sorted by descending score with ties broken by chunk id,
    /// so the ordering is stable across calls. A mismatched query dimension
    /// fails the whole search.
    pub async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<SearchHit>> {
        let chunks = self.chunks.read().await;

        let mut hits = Vec::with_capacity(chunks.len());
        for record in chunks.values() {
            let score = cosine_similarity(query, &record.embedding)?;
            if min_score.is_some_and(|min| score < min) {
                continue;
            }
            hits.push(SearchHit {
                chunk_id: record.id,
                document_id: record.document_id,
                text: record.text.clone(),
                chunk_index: record.chunk_index,
                score,
            });
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk_id.as_uuid().cmp(b.chunk_id.as_uuid()))
        });
        hits.truncate(top_k);

        Ok(hits)
    }
}
