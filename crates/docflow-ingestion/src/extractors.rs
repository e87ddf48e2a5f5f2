//! Text extractors for supported document formats.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{IngestionError, Result};

/// Result of text extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted text content
    pub text: String,
    /// Extracted metadata (headings, key counts, ...)
    pub metadata: HashMap<String, serde_json::Value>,
    /// Character encoding of the source
    pub encoding: String,
    /// Warnings raised during extraction
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: HashMap::new(),
            encoding: "utf-8".to_string(),
            warnings: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Extracts plain text from raw document content.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text from document content.
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult>;

    /// Content types this extractor handles.
    fn supported_types(&self) -> Vec<&'static str>;

    /// Whether this extractor can handle the content type.
    fn can_handle(&self, content_type: &str) -> bool {
        self.supported_types()
            .iter()
            .any(|&t| content_type.starts_with(t))
    }

    /// Extractor name.
    fn name(&self) -> &'static str;
}

/// Plain text extractor with encoding fallback.
#[derive(Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult> {
        let (text, encoding) = match std::str::from_utf8(content) {
            Ok(s) => (s.to_string(), "utf-8".to_string()),
            Err(_) => {
                let (decoded, actual, had_errors) = encoding_rs::WINDOWS_1252.decode(content);
                let name = if had_errors {
                    "windows-1252-lossy".to_string()
                } else {
                    actual.name().to_string()
                };
                (decoded.into_owned(), name)
            }
        };

        let mut result = ExtractionResult::new(text);
        result.encoding = encoding;
        Ok(result)
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["text/plain", "text/csv", "text/"]
    }

    fn name(&self) -> &'static str {
        "plain_text"
    }
}

/// Markdown extractor: strips syntax and records headings.
#[derive(Default)]
pub struct MarkdownExtractor;

impl MarkdownExtractor {
    pub fn new() -> Self {
        Self
    }

    fn strip_line(line: &str) -> String {
        let line = line.trim_start_matches('#').trim();
        let line = line.trim_start_matches("- ").trim_start_matches("* ");
        let mut out = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' | '_' | '`' => {}
                '[' => {
                    // Keep link text, drop the target
                    for inner in chars.by_ref() {
                        if inner == ']' {
                            break;
                        }
                        out.push(inner);
                    }
                    if chars.peek() == Some(&'(') {
                        for inner in chars.by_ref() {
                            if inner == ')' {
                                break;
                            }
                        }
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }
}

#[async_trait]
impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult> {
        let source = String::from_utf8_lossy(content);

        let mut headings = Vec::new();
        let mut lines = Vec::new();
        for line in source.lines() {
            if let Some(heading) = line.strip_prefix('#') {
                headings.push(heading.trim_start_matches('#').trim().to_string());
            }
            lines.push(Self::strip_line(line));
        }

        let text = lines.join("\n");
        debug!(headings = headings.len(), "Markdown extracted");

        Ok(ExtractionResult::new(text)
            .with_metadata("headings", serde_json::json!(headings)))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["text/markdown", "text/x-markdown"]
    }

    fn name(&self) -> &'static str {
        "markdown"
    }
}

/// JSON extractor: flattens string values into searchable text.
#[derive(Default)]
pub struct JsonExtractor;

impl JsonExtractor {
    pub fn new() -> Self {
        Self
    }

    fn collect_strings(value: &serde_json::Value, out: &mut Vec<String>) {
        match value {
            serde_json::Value::String(s) => out.push(s.clone()),
            serde_json::Value::Array(items) => {
                for item in items {
                    Self::collect_strings(item, out);
                }
            }
            serde_json::Value::Object(map) => {
                for (key, item) in map {
                    out.push(key.clone());
                    Self::collect_strings(item, out);
                }
            }
            serde_json::Value::Number(n) => out.push(n.to_string()),
            _ => {}
        }
    }
}

#[async_trait]
impl TextExtractor for JsonExtractor {
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult> {
        let value: serde_json::Value = serde_json::from_slice(content)
            .map_err(|e| IngestionError::ExtractionFailed(format!("invalid JSON: {}", e)))?;

        let mut strings = Vec::new();
        Self::collect_strings(&value, &mut strings);
        let count = strings.len();

        Ok(ExtractionResult::new(strings.join("\n"))
            .with_metadata("value_count", serde_json::json!(count)))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["application/json", "text/json"]
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Registry of extractors keyed by content type, with filename fallback.
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn TextExtractor>>,
    fallback: Arc<dyn TextExtractor>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
            fallback: Arc::new(PlainTextExtractor::new()),
        }
    }

    /// Registry with the built-in extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MarkdownExtractor::new()));
        registry.register(Arc::new(JsonExtractor::new()));
        registry.register(Arc::new(PlainTextExtractor::new()));
        registry
    }

    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) {
        self.extractors.push(extractor);
    }

    /// Extractor for a content type. Unknown types fall back to plain text.
    pub fn for_content_type(&self, content_type: &str) -> Arc<dyn TextExtractor> {
        self.extractors
            .iter()
            .find(|e| e.can_handle(content_type))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Extractor for a filename, guessing the content type from its extension.
    pub fn for_filename(&self, filename: &str) -> Arc<dyn TextExtractor> {
        let content_type = mime_guess::from_path(filename)
            .first_or_text_plain()
            .to_string();
        self.for_content_type(&content_type)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_utf8() {
        let extractor = PlainTextExtractor::new();
        let result = extractor.extract("hello world".as_bytes()).await.unwrap();

        assert_eq!(result.text, "hello world");
        assert_eq!(result.encoding, "utf-8");
    }

    #[tokio::test]
    async fn test_plain_text_latin1_fallback() {
        let extractor = PlainTextExtractor::new();
        // "café" in latin-1
        let result = extractor.extract(&[0x63, 0x61, 0x66, 0xe9]).await.unwrap();

        assert_eq!(result.text, "café");
        assert_ne!(result.encoding, "utf-8");
    }

    #[tokio::test]
    async fn test_markdown_strips_syntax_and_records_headings() {
        let extractor = MarkdownExtractor::new();
        let source = "# Title\n\nSome **bold** text with a [link](https://example.com).\n\n## Section\n";
        let result = extractor.extract(source.as_bytes()).await.unwrap();

        assert!(result.text.contains("Some bold text with a link."));
        assert!(!result.text.contains("**"));
        assert!(!result.text.contains("https://example.com"));

        let headings = result.metadata.get("headings").unwrap();
        assert_eq!(headings, &serde_json::json!(["Title", "Section"]));
    }

    #[tokio::test]
    async fn test_json_flattens_values() {
        let extractor = JsonExtractor::new();
        let source = r#"{"name": "Acme", "items": [{"sku": "A-1", "price": 42}]}"#;
        let result = extractor.extract(source.as_bytes()).await.unwrap();

        assert!(result.text.contains("Acme"));
        assert!(result.text.contains("A-1"));
        assert!(result.text.contains("42"));
    }

    #[tokio::test]
    async fn test_json_rejects_invalid() {
        let extractor = JsonExtractor::new();
        let err = extractor.extract(b"{not json").await.unwrap_err();
        assert!(matches!(err, IngestionError::ExtractionFailed(_)));
    }

    #[test]
    fn test_registry_routing() {
        let registry = ExtractorRegistry::with_defaults();

        assert_eq!(registry.for_content_type("text/markdown").name(), "markdown");
        assert_eq!(registry.for_content_type("application/json").name(), "json");
        assert_eq!(registry.for_content_type("text/plain").name(), "plain_text");
        // Unknown types fall back to plain text
        assert_eq!(
            registry.for_content_type("application/octet-stream").name(),
            "plain_text"
        );
    }

    #[test]
    fn test_registry_filename_routing() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(registry.for_filename("notes.md").name(), "markdown");
        assert_eq!(registry.for_filename("data.json").name(), "json");
        assert_eq!(registry.for_filename("readme.txt").name(), "plain_text");
    }
}
