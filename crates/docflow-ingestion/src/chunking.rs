//! Fixed-size text chunking with overlap.

use docflow_core::{ChunkId, DocumentId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{IngestionError, Result};

/// A chunk of extracted document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier
    pub id: ChunkId,
    /// Source document
    pub document_id: DocumentId,
    /// Chunk content
    pub content: String,
    /// Zero-based index within the document
    pub index: usize,
    /// Start character offset in the extracted text
    pub start_offset: usize,
    /// End character offset in the extracted text
    pub end_offset: usize,
    /// Approximate token count
    pub token_count: usize,
}

/// Configuration for text chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in tokens
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in tokens
    pub chunk_overlap: usize,
    /// Chunks smaller than this (in tokens) are dropped
    pub min_chunk_size: usize,
    /// Prefer breaking at paragraph boundaries near the chunk end
    pub preserve_paragraphs: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
            min_chunk_size: 5,
            preserve_paragraphs: true,
        }
    }
}

impl ChunkingConfig {
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.chunk_overlap = overlap;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(IngestionError::InvalidConfig(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestionError::InvalidConfig(
                "chunk overlap must be less than chunk size".to_string(),
            ));
        }
        Ok(())
    }
}

// Approximation used throughout: ~4 characters per token.
const CHARS_PER_TOKEN: usize = 4;

fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() + CHARS_PER_TOKEN - 1) / CHARS_PER_TOKEN
}

/// Splits extracted text into fixed-size chunks with overlap.
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Chunk a document's extracted text.
    ///
    /// Chunk indexes are dense from 0. Empty or whitespace-only input
    /// yields no chunks.
    pub fn chunk(&self, document_id: DocumentId, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        let chunk_chars = self.config.chunk_size * CHARS_PER_TOKEN;
        let overlap_chars = self.config.chunk_overlap * CHARS_PER_TOKEN;
        let step = chunk_chars.saturating_sub(overlap_chars).max(1);

        let mut spans = Vec::new();
        let mut start = 0;
        while start < total {
            let mut end = (start + chunk_chars).min(total);
            if self.config.preserve_paragraphs && end < total {
                end = self.adjust_to_paragraph(&chars, start, end);
            }
            spans.push((start, end));
            if end >= total {
                break;
            }
            start += step.min(end.saturating_sub(start).max(1));
        }

        let mut chunks = Vec::new();
        for (start, end) in spans {
            let content: String = chars[start..end].iter().collect();
            let trimmed = content.trim();
            if trimmed.is_empty() || estimate_tokens(trimmed) < self.config.min_chunk_size {
                continue;
            }
            // Offsets track the trimmed content so they slice back to it
            let leading = content.chars().take_while(|c| c.is_whitespace()).count();
            let trimmed_chars = trimmed.chars().count();
            chunks.push(Chunk {
                id: ChunkId::new(),
                document_id,
                content: trimmed.to_string(),
                index: chunks.len(),
                start_offset: start + leading,
                end_offset: start + leading + trimmed_chars,
                token_count: estimate_tokens(trimmed),
            });
        }

        debug!(
            document_id = %document_id,
            chunk_count = chunks.len(),
            "Document chunked"
        );

        chunks
    }

    /// Pull the chunk end back to the nearest paragraph break, if one falls
    /// in the second half of the chunk.
    fn adjust_to_paragraph(&self, chars: &[char], start: usize, end: usize) -> usize {
        let midpoint = start + (end - start) / 2;
        let mut candidate = end;
        while candidate > midpoint {
            if chars[candidate - 1] == '\n'
                && candidate >= 2
                && chars[candidate - 2] == '\n'
            {
                return candidate;
            }
            candidate -= 1;
        }
        end
    }
}
