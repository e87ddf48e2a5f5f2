//! Identifiers and the document data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn parse(s: &str) -> Option<Self> {
                Uuid::parse_str(s).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier for an uploaded document.
    DocumentId
);
uuid_id!(
    /// Identifier for a chunk of extracted text.
    ChunkId
);
uuid_id!(
    /// Identifier for a single workflow execution.
    ExecutionId
);

/// Identifier for a workflow definition.
///
/// Definitions are a static registry, so the id is a stable slug rather
/// than a generated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkflowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Processing status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Document persisted, no workflow has touched it yet
    Uploaded,
    /// A workflow execution is in flight
    Processing,
    /// The last workflow execution completed successfully
    Completed,
    /// The last workflow execution failed
    Failed,
}

impl DocumentStatus {
    /// Whether the status is terminal for an execution.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }
}

/// A persisted document record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document identifier
    pub id: DocumentId,
    /// Original filename
    pub filename: String,
    /// MIME content type
    pub content_type: String,
    /// Size of the raw content in bytes
    pub size: usize,
    /// Who uploaded the document
    pub uploaded_by: Option<String>,
    /// Optional category used for workflow selection
    pub category: Option<String>,
    /// Current processing status
    pub status: DocumentStatus,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
    /// Free-form summary written by processing steps
    #[serde(default)]
    pub summary: Option<serde_json::Value>,
}

impl DocumentRecord {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, size: usize) -> Self {
        Self {
            id: DocumentId::new(),
            filename: filename.into(),
            content_type: content_type.into(),
            size,
            uploaded_by: None,
            category: None,
            status: DocumentStatus::Uploaded,
            uploaded_at: Utc::now(),
            summary: None,
        }
    }

    pub fn with_uploaded_by(mut self, user: impl Into<String>) -> Self {
        self.uploaded_by = Some(user.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_display_roundtrip() {
        let id = DocumentId::new();
        let parsed = DocumentId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_document_id_parse_rejects_garbage() {
        assert!(DocumentId::parse("not-a-uuid").is_none());
    }

    #[test]
    fn test_status_terminality() {
        assert!(!DocumentStatus::Uploaded.is_terminal());
        assert!(!DocumentStatus::Processing.is_terminal());
        assert!(DocumentStatus::Completed.is_terminal());
        assert!(DocumentStatus::Failed.is_terminal());
    }

    #[test]
    fn test_document_record_builder() {
        let record = DocumentRecord::new("invoice.pdf", "application/pdf", 2048)
            .with_uploaded_by("alice")
            .with_category("invoice");

        assert_eq!(record.filename, "invoice.pdf");
        assert_eq!(record.status, DocumentStatus::Uploaded);
        assert_eq!(record.uploaded_by.as_deref(), Some("alice"));
        assert_eq!(record.category.as_deref(), Some("invoice"));
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&DocumentStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
