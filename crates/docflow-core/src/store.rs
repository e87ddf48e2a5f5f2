//! Persistence traits and in-memory implementations.
//!
//! The document store holds document records and raw content; the step
//! journal is an append-only log of per-step workflow results keyed by
//! (execution id, step index). Keeping the journal append-only means a
//! failed workflow never discards the results of steps that already ran,
//! and concurrent writers cannot lose each other's updates.

use crate::types::{DocumentId, DocumentRecord, DocumentStatus, ExecutionId};
use crate::{CoreError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Store for document records and their raw content.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document with its raw content.
    async fn insert(&self, record: DocumentRecord, content: Vec<u8>) -> Result<()>;

    /// Fetch a document record.
    async fn get(&self, id: DocumentId) -> Result<DocumentRecord>;

    /// Fetch the raw content of a document.
    async fn content(&self, id: DocumentId) -> Result<Vec<u8>>;

    /// List all document records, newest first.
    async fn list(&self) -> Result<Vec<DocumentRecord>>;

    /// Update the processing status of a document.
    async fn update_status(&self, id: DocumentId, status: DocumentStatus) -> Result<()>;

    /// Attach a processing summary to a document.
    async fn set_summary(&self, id: DocumentId, summary: serde_json::Value) -> Result<()>;

    /// Delete a document record and its content.
    async fn delete(&self, id: DocumentId) -> Result<()>;
}

/// A single journaled step result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Execution this entry belongs to
    pub execution_id: ExecutionId,
    /// Zero-based step index within the workflow
    pub step_index: usize,
    /// Step name from the workflow definition
    pub step_name: String,
    /// Step output
    pub output: serde_json::Value,
    /// When the step completed
    pub recorded_at: DateTime<Utc>,
}

/// Append-only log of step results.
#[async_trait]
pub trait StepJournal: Send + Sync {
    /// Append a step result.
    ///
    /// Appending is idempotent: if an entry already exists for
    /// (execution_id, step_index), the existing entry is returned
    /// unchanged and the new one is dropped.
    async fn append(&self, entry: JournalEntry) -> Result<JournalEntry>;

    /// All entries for an execution, ordered by step index.
    async fn entries(&self, execution_id: ExecutionId) -> Result<Vec<JournalEntry>>;
}

/// In-memory document store.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<HashMap<DocumentId, (DocumentRecord, Vec<u8>)>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, record: DocumentRecord, content: Vec<u8>) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.insert(record.id, (record, content));
        Ok(())
    }

    async fn get(&self, id: DocumentId) -> Result<DocumentRecord> {
        let inner = self.inner.read().await;
        inner
            .get(&id)
            .map(|(record, _)| record.clone())
            .ok_or(CoreError::DocumentNotFound(id))
    }

    async fn content(&self, id: DocumentId) -> Result<Vec<u8>> {
        let inner = self.inner.read().await;
        inner
            .get(&id)
            .map(|(_, content)| content.clone())
            .ok_or(CoreError::DocumentNotFound(id))
    }

    async fn list(&self) -> Result<Vec<DocumentRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<_> = inner.values().map(|(record, _)| record.clone()).collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }

    async fn update_status(&self, id: DocumentId, status: DocumentStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        let (record, _) = inner.get_mut(&id).ok_or(CoreError::DocumentNotFound(id))?;
        record.status = status;
        Ok(())
    }

    async fn set_summary(&self, id: DocumentId, summary: serde_json::Value) -> Result<()> {
        let mut inner = self.inner.write().await;
        let (record, _) = inner.get_mut(&id).ok_or(CoreError::DocumentNotFound(id))?;
        record.summary = Some(summary);
        Ok(())
    }

    async fn delete(&self, id: DocumentId) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.remove(&id).ok_or(CoreError::DocumentNotFound(id))?;
        Ok(())
    }
}

/// In-memory step journal.
#[derive(Clone, Default)]
pub struct InMemoryStepJournal {
    inner: Arc<RwLock<HashMap<(ExecutionId, usize), JournalEntry>>>,
}

impl InMemoryStepJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StepJournal for InMemoryStepJournal {
    async fn append(&self, entry: JournalEntry) -> Result<JournalEntry> {
        let mut inner = self.inner.write().await;
        let key = (entry.execution_id, entry.step_index);
        // First writer wins; replays see the original entry
        let stored = inner.entry(key).or_insert(entry);
        Ok(stored.clone())
    }

    async fn entries(&self, execution_id: ExecutionId) -> Result<Vec<JournalEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<_> = inner
            .values()
            .filter(|entry| entry.execution_id == execution_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.step_index);
        Ok(entries)
    }
}
