//! Step handlers.
//!
//! Each workflow step kind maps to one handler. Handlers receive the
//! document being processed and a step-specific configuration value, and
//! return a JSON output that the executor journals.

use crate::step::StepKind;
use crate::{Result, WorkflowError};
use async_trait::async_trait;
use docflow_core::{DocumentRecord, DocumentStore, Event, EventBus, ExecutionId, StepJournal};
use docflow_extract::EntityExtractor;
use docflow_index::VectorStore;
use docflow_ingestion::IngestionPipeline;
use docflow_integrations::{Notification, NotificationDispatcher};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Context passed to every step of an execution.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// The execution this step runs under
    pub execution_id: ExecutionId,
    /// The document being processed
    pub document: DocumentRecord,
}

/// A single step implementation.
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// The step kind this handler serves.
    fn kind(&self) -> StepKind;

    /// Run the step and return its journaled output.
    async fn run(&self, ctx: &StepContext, config: &serde_json::Value)
        -> Result<serde_json::Value>;
}

impl std::fmt::Debug for dyn StepHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StepHandler({:?})", self.kind())
    }
}

/// Extracts text from the raw document, chunks it, embeds the chunks, and
/// writes them to the vector index.
pub struct ExtractTextHandler {
    documents: Arc<dyn DocumentStore>,
    pipeline: Arc<IngestionPipeline>,
}

impl ExtractTextHandler {
    pub fn new(documents: Arc<dyn DocumentStore>, pipeline: Arc<IngestionPipeline>) -> Self {
        Self { documents, pipeline }
    }
}

#[async_trait]
impl StepHandler for ExtractTextHandler {
    fn kind(&self) -> StepKind {
        StepKind::ExtractText
    }

    async fn run(
        &self,
        ctx: &StepContext,
        _config: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let content = self.documents.content(ctx.document.id).await?;

        let result = self
            .pipeline
            .ingest(&ctx.document, &content)
            .await
            .map_err(|e| WorkflowError::StepFailed {
                step: "extract_text".to_string(),
                reason: e.to_string(),
            })?;

        info!(
            document_id = %ctx.document.id,
            chunks = result.chunk_count,
            text_length = result.text_length,
            "Document indexed"
        );
        Ok(serde_json::to_value(result)?)
    }
}

/// Runs entity extraction over the document's indexed text.
pub struct AnalyzeContentHandler {
    index: VectorStore,
    extractor: Arc<EntityExtractor>,
}

impl AnalyzeContentHandler {
    pub fn new(index: VectorStore, extractor: Arc<EntityExtractor>) -> Self {
        Self { index, extractor }
    }
}

#[async_trait]
impl StepHandler for AnalyzeContentHandler {
    fn kind(&self) -> StepKind {
        StepKind::AnalyzeContent
    }

    async fn run(
        &self,
        ctx: &StepContext,
        config: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let chunks = self.index.document_chunks(ctx.document.id).await;
        if chunks.is_empty() {
            return Err(WorkflowError::StepFailed {
                step: "analyze_content".to_string(),
                reason: "document has no indexed text".to_string(),
            });
        }

        let text = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let outcome = self.extractor.extract(&text).await;

        let focus = config.get("focus").and_then(|v| v.as_str());
        debug!(
            document_id = %ctx.document.id,
            entities = outcome.entities.len(),
            risk = outcome.risk,
            focus = focus.unwrap_or("general"),
            "Content analyzed"
        );

        let entity_count = outcome.entities.len();
        Ok(serde_json::json!({
            "entities": outcome.entities,
            "entity_count": entity_count,
            "risk": outcome.risk,
            "model_used": outcome.model_used,
            "failed_windows": outcome.failed_windows,
            "focus": focus,
        }))
    }
}

/// Notifies enabled integrations that processing reached this step.
pub struct SendNotificationHandler {
    dispatcher: Arc<NotificationDispatcher>,
    events: EventBus,
}

impl SendNotificationHandler {
    pub fn new(dispatcher: Arc<NotificationDispatcher>, events: EventBus) -> Self {
        Self { dispatcher, events }
    }
}

#[async_trait]
impl StepHandler for SendNotificationHandler {
    fn kind(&self) -> StepKind {
        StepKind::SendNotification
    }

    async fn run(
        &self,
        ctx: &StepContext,
        _config: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let notification = Notification::new(
            format!("Document processed: {}", ctx.document.filename),
            format!(
                "Document {} ({}) finished processing.",
                ctx.document.filename, ctx.document.id
            ),
        )
        .with_payload(serde_json::json!({
            "document_id": ctx.document.id,
            "execution_id": ctx.execution_id,
            "filename": ctx.document.filename.clone(),
        }));

        let reports = self.dispatcher.dispatch(&notification).await;
        let delivered = reports.iter().filter(|r| r.delivered).count();
        let failed = reports.len() - delivered;

        for report in reports.iter().filter(|r| r.delivered) {
            self.events.publish(Event::new(
                "integration.notified",
                serde_json::json!({
                    "document_id": ctx.document.id,
                    "integration_id": report.integration_id,
                    "integration": report.integration_name.clone(),
                }),
            ));
        }

        info!(
            document_id = %ctx.document.id,
            delivered,
            failed,
            "Notifications dispatched"
        );
        Ok(serde_json::json!({
            "delivered": delivered,
            "failed": failed,
            "reports": reports,
        }))
    }
}

/// Writes the accumulated step outputs back to the document as its summary.
pub struct StoreDataHandler {
    documents: Arc<dyn DocumentStore>,
    journal: Arc<dyn StepJournal>,
}

impl StoreDataHandler {
    pub fn new(documents: Arc<dyn DocumentStore>, journal: Arc<dyn StepJournal>) -> Self {
        Self { documents, journal }
    }
}

#[async_trait]
impl StepHandler for StoreDataHandler {
    fn kind(&self) -> StepKind {
        StepKind::StoreData
    }

    async fn run(
        &self,
        ctx: &StepContext,
        _config: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let entries = self.journal.entries(ctx.execution_id).await?;

        let mut steps = serde_json::Map::new();
        for entry in &entries {
            steps.insert(entry.step_name.clone(), entry.output.clone());
        }
        let summary = serde_json::json!({
            "execution_id": ctx.execution_id,
            "steps": steps,
            "stored_at": chrono::Utc::now(),
        });

        self.documents
            .set_summary(ctx.document.id, summary.clone())
            .await?;

        debug!(document_id = %ctx.document.id, steps = entries.len(), "Summary stored");
        Ok(serde_json::json!({ "stored_steps": entries.len() }))
    }
}

/// Handler lookup table used by the executor.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: HashMap<StepKind, Arc<dyn StepHandler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own kind, replacing any previous one.
    pub fn register(mut self, handler: Arc<dyn StepHandler>) -> Self {
        self.handlers.insert(handler.kind(), handler);
        self
    }

    pub fn get(&self, kind: StepKind) -> Result<Arc<dyn StepHandler>> {
        self.handlers
            .get(&kind)
            .cloned()
            .ok_or(WorkflowError::NoHandler(kind))
    }
}
