//! Sequential workflow execution with journaled step results.

use crate::definitions::WorkflowDefinition;
use crate::handlers::{HandlerSet, StepContext};
use crate::step::StepSpec;
use crate::{Result, WorkflowError};
use chrono::{DateTime, Utc};
use docflow_core::{
    DocumentId, DocumentStatus, DocumentStore, Event, EventBus, ExecutionId, JournalEntry,
    StepJournal, WorkflowId,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Terminal-or-not status of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

/// Snapshot of one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
    pub execution_id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub document_id: DocumentId,
    pub status: ExecutionStatus,
    pub completed_steps: usize,
    pub total_steps: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Runs workflow definitions step by step.
///
/// Each completed step is appended to the journal before the next starts.
/// A failed step leaves earlier results in place and marks the document
/// failed. Re-running with the same execution id skips journaled steps,
/// so replays after a crash or partial failure are idempotent.
pub struct WorkflowExecutor {
    documents: Arc<dyn DocumentStore>,
    journal: Arc<dyn StepJournal>,
    handlers: HandlerSet,
    events: EventBus,
    executions: Arc<RwLock<HashMap<ExecutionId, ExecutionState>>>,
}

impl WorkflowExecutor {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        journal: Arc<dyn StepJournal>,
        handlers: HandlerSet,
        events: EventBus,
    ) -> Self {
        Self {
            documents,
            journal,
            handlers,
            events,
            executions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Execute a workflow against a document.
    ///
    /// Passing an `execution_id` from a previous run resumes it: steps
    /// already in the journal are not run again.
    pub async fn execute(
        &self,
        definition: &WorkflowDefinition,
        document_id: DocumentId,
        execution_id: Option<ExecutionId>,
    ) -> Result<ExecutionState> {
        definition.validate()?;
        let document = self.documents.get(document_id).await?;
        let execution_id = execution_id.unwrap_or_default();

        let mut state = ExecutionState {
            execution_id,
            workflow_id: definition.id.clone(),
            document_id,
            status: ExecutionStatus::Running,
            completed_steps: 0,
            total_steps: definition.steps.len(),
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        };
        self.save_state(state.clone()).await;

        self.documents
            .update_status(document_id, DocumentStatus::Processing)
            .await?;
        self.events.publish(
            Event::new(
                "workflow.started",
                serde_json::json!({
                    "execution_id": execution_id,
                    "workflow_id": definition.id.as_str(),
                    "document_id": document_id,
                }),
            )
            .with_metadata("workflow", definition.id.as_str()),
        );
        info!(
            execution_id = %execution_id,
            workflow = %definition.id,
            document_id = %document_id,
            steps = definition.steps.len(),
            "Workflow started"
        );

        let journaled: HashSet<usize> = self
            .journal
            .entries(execution_id)
            .await?
            .into_iter()
            .map(|e| e.step_index)
            .collect();

        let ctx = StepContext {
            execution_id,
            document,
        };

        for (index, step) in definition.steps.iter().enumerate() {
            if journaled.contains(&index) {
                debug!(
                    execution_id = %execution_id,
                    step = %step.name,
                    "Step already journaled, skipping"
                );
                state.completed_steps += 1;
                continue;
            }

            match self.run_step(&ctx, index, step).await {
                Ok(output) => {
                    self.journal
                        .append(JournalEntry {
                            execution_id,
                            step_index: index,
                            step_name: step.name.clone(),
                            output,
                            recorded_at: Utc::now(),
                        })
                        .await?;
                    state.completed_steps += 1;
                    self.save_state(state.clone()).await;
                    self.events.publish(Event::new(
                        "workflow.step_completed",
                        serde_json::json!({
                            "execution_id": execution_id,
                            "step": step.name.clone(),
                            "step_index": index,
                        }),
                    ));
                }
                Err(err) => {
                    error!(
                        execution_id = %execution_id,
                        step = %step.name,
                        error = %err,
                        "Workflow step failed"
                    );
                    self.documents
                        .update_status(document_id, DocumentStatus::Failed)
                        .await?;
                    state.status = ExecutionStatus::Failed;
                    state.finished_at = Some(Utc::now());
                    state.error = Some(err.to_string());
                    self.save_state(state.clone()).await;
                    self.events.publish(Event::new(
                        "workflow.failed",
                        serde_json::json!({
                            "execution_id": execution_id,
                            "step": step.name.clone(),
                            "error": err.to_string(),
                        }),
                    ));
                    // Earlier step results stay in the journal for
                    // inspection and resumption.
                    return Ok(state);
                }
            }
        }

        self.documents
            .update_status(document_id, DocumentStatus::Completed)
            .await?;
        state.status = ExecutionStatus::Completed;
        state.finished_at = Some(Utc::now());
        self.save_state(state.clone()).await;
        self.events.publish(Event::new(
            "workflow.completed",
            serde_json::json!({
                "execution_id": execution_id,
                "document_id": document_id,
            }),
        ));
        info!(execution_id = %execution_id, "Workflow completed");
        Ok(state)
    }

    /// Run one step, honoring its retry policy.
    async fn run_step(
        &self,
        ctx: &StepContext,
        index: usize,
        step: &StepSpec,
    ) -> Result<serde_json::Value> {
        let handler = self.handlers.get(step.kind)?;

        let mut attempt = 1;
        loop {
            debug!(
                execution_id = %ctx.execution_id,
                step = %step.name,
                step_index = index,
                attempt,
                "Running step"
            );
            match handler.run(ctx, &step.config).await {
                Ok(output) => return Ok(output),
                Err(err) if attempt < step.retry.max_attempts => {
                    let backoff = step.retry.backoff(attempt);
                    warn!(
                        execution_id = %ctx.execution_id,
                        step = %step.name,
                        attempt,
                        error = %err,
                        backoff_ms = backoff.as_millis() as u64,
                        "Step attempt failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(WorkflowError::StepFailed {
                        step: step.name.clone(),
                        reason: err.to_string(),
                    })
                }
            }
        }
    }

    /// Look up an execution snapshot.
    pub async fn get_state(&self, execution_id: ExecutionId) -> Result<ExecutionState> {
        self.executions
            .read()
            .await
            .get(&execution_id)
            .cloned()
            .ok_or_else(|| WorkflowError::ExecutionNotFound(execution_id.to_string()))
    }

    /// Journaled step results for an execution, in step order.
    pub async fn step_results(&self, execution_id: ExecutionId) -> Result<Vec<JournalEntry>> {
        Ok(self.journal.entries(execution_id).await?)
    }

    async fn save_state(&self, state: ExecutionState) {
        self.executions
            .write()
            .await
            .insert(state.execution_id, state);
    }
}
