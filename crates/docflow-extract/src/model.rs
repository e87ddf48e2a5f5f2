//! NER model clients.

use crate::{ExtractError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// A labeled span returned by a token-classification model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSpan {
    /// Model label (e.g. "B-PER", "ORG")
    #[serde(alias = "entity_group", alias = "entity")]
    pub label: String,
    /// Matched text
    pub word: String,
    /// Character span in the submitted window
    pub start: usize,
    pub end: usize,
    /// Confidence score
    pub score: f64,
}

/// Token-classification model.
#[async_trait]
pub trait NerModel: Send + Sync {
    /// Run the model over one window of text.
    async fn classify(&self, text: &str) -> Result<Vec<ModelSpan>>;
}

/// Client for Hugging Face-style token-classification inference endpoints.
pub struct HttpNerClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpNerClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Apply a client-side timeout to every classification request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }
}

#[async_trait]
impl NerModel for HttpNerClient {
    async fn classify(&self, text: &str) -> Result<Vec<ModelSpan>> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "inputs": text,
                "parameters": { "aggregation_strategy": "simple" }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ExtractError::ModelFailed(format!("{}: {}", status, detail)));
        }

        let spans: Vec<ModelSpan> = response.json().await?;
        debug!(spans = spans.len(), "Model classification complete");
        Ok(spans)
    }
}

/// Split text into model-sized windows at whitespace boundaries.
///
/// Returns (window text, byte offset into the full text) pairs. The
/// offset lets callers map window-relative spans back onto the document
/// with plain slicing, even for non-ASCII input.
pub fn window_text(text: &str, window_chars: usize) -> Vec<(String, usize)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let window_chars = window_chars.max(1);

    let mut windows = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let mut end = (start + window_chars).min(chars.len());
        if end < chars.len() {
            // Back up to the last whitespace so tokens stay intact
            let mut candidate = end;
            while candidate > start && !chars[candidate - 1].1.is_whitespace() {
                candidate -= 1;
            }
            if candidate > start {
                end = candidate;
            }
        }
        let byte_start = chars[start].0;
        let byte_end = if end < chars.len() { chars[end].0 } else { text.len() };
        windows.push((text[byte_start..byte_end].to_string(), byte_start));
        start = end;
    }
    windows
}

/// Convert a model span's character indices to byte offsets within `window`.
///
/// Models report character positions; entity spans are byte offsets so
/// they slice the source text directly. Returns `None` for spans that do
/// not fit the window.
pub fn span_to_byte_range(window: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    if start >= end {
        return None;
    }
    let mut byte_start = None;
    let mut byte_end = None;
    for (char_idx, (byte_idx, ch)) in window.char_indices().enumerate() {
        if char_idx == start {
            byte_start = Some(byte_idx);
        }
        if char_idx + 1 == end {
            byte_end = Some(byte_idx + ch.len_utf8());
            break;
        }
    }
    Some((byte_start?, byte_end?))
}
