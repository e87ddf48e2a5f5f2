//! Built-in workflow definitions and workflow selection.

use crate::step::{RetryPolicy, StepKind, StepSpec};
use crate::{Result, WorkflowError};
use docflow_core::{DocumentRecord, WorkflowId};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A workflow definition: an ordered list of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Stable workflow identifier
    pub id: WorkflowId,
    /// Display name
    pub name: String,
    /// What the workflow is for
    pub description: String,
    /// Ordered steps
    pub steps: Vec<StepSpec>,
}

impl WorkflowDefinition {
    pub fn new(
        id: impl Into<WorkflowId>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
        }
    }

    pub fn add_step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    /// Validate the definition: at least one step, unique step names.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(WorkflowError::InvalidDefinition(
                "workflow has no steps".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(WorkflowError::InvalidDefinition(format!(
                    "duplicate step name '{}'",
                    step.name
                )));
            }
        }
        Ok(())
    }
}

static BUILTINS: Lazy<Vec<WorkflowDefinition>> = Lazy::new(|| {
    vec![
        WorkflowDefinition::new(
            "standard-processing",
            "Standard processing",
            "Full pipeline: extract, analyze, notify, store",
        )
        .add_step(StepSpec::new("extract_text", StepKind::ExtractText))
        .add_step(StepSpec::new("analyze_content", StepKind::AnalyzeContent))
        .add_step(StepSpec::new("send_notification", StepKind::SendNotification))
        .add_step(StepSpec::new("store_data", StepKind::StoreData)),
        WorkflowDefinition::new(
            "invoice-processing",
            "Invoice processing",
            "Extraction tuned for invoices, with retried analysis",
        )
        .add_step(StepSpec::new("extract_text", StepKind::ExtractText))
        .add_step(
            StepSpec::new("analyze_content", StepKind::AnalyzeContent)
                .with_config(serde_json::json!({"focus": "invoice"}))
                .with_retry(RetryPolicy::with_attempts(3)),
        )
        .add_step(StepSpec::new("store_data", StepKind::StoreData))
        .add_step(StepSpec::new("send_notification", StepKind::SendNotification)),
        WorkflowDefinition::new(
            "contract-review",
            "Contract review",
            "Extraction plus entity analysis for contracts, with reviewer notification",
        )
        .add_step(StepSpec::new("extract_text", StepKind::ExtractText))
        .add_step(
            StepSpec::new("analyze_content", StepKind::AnalyzeContent)
                .with_config(serde_json::json!({"focus": "contract"})),
        )
        .add_step(StepSpec::new("send_notification", StepKind::SendNotification)),
        WorkflowDefinition::new(
            "quick-scan",
            "Quick scan",
            "Index the document without analysis or notifications",
        )
        .add_step(StepSpec::new("extract_text", StepKind::ExtractText))
        .add_step(StepSpec::new("store_data", StepKind::StoreData)),
    ]
});

static CATEGORY_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("invoice", "invoice-processing"),
        ("contract", "contract-review"),
        ("receipt", "invoice-processing"),
        ("scan", "quick-scan"),
    ])
});

const DEFAULT_WORKFLOW: &str = "standard-processing";

/// Registry of workflow definitions.
#[derive(Clone, Default)]
pub struct WorkflowRegistry;

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self
    }

    /// All known definitions.
    pub fn list(&self) -> &'static [WorkflowDefinition] {
        &BUILTINS
    }

    /// Look up a definition.
    pub fn get(&self, id: &WorkflowId) -> Result<&'static WorkflowDefinition> {
        BUILTINS
            .iter()
            .find(|w| &w.id == id)
            .ok_or_else(|| WorkflowError::UnknownWorkflow(id.to_string()))
    }
}

/// Select the workflow for a document.
///
/// Precedence: an explicit workflow id (an unknown one is an error), then
/// the document category, then a filename/content-type heuristic, then the
/// standard workflow.
pub fn select_workflow<'a>(
    registry: &'a WorkflowRegistry,
    document: &DocumentRecord,
    explicit: Option<&WorkflowId>,
) -> Result<&'a WorkflowDefinition> {
    if let Some(id) = explicit {
        return registry.get(id);
    }

    if let Some(category) = document.category.as_deref() {
        if let Some(&id) = CATEGORY_MAP.get(category.to_lowercase().as_str()) {
            return registry.get(&WorkflowId::new(id));
        }
    }

    let filename = document.filename.to_lowercase();
    let heuristic = if filename.contains("invoice") || filename.contains("receipt") {
        Some("invoice-processing")
    } else if filename.contains("contract") || filename.contains("agreement") {
        Some("contract-review")
    } else if document.content_type == "application/json" {
        // Structured payloads get indexed without entity analysis
        Some("quick-scan")
    } else {
        None
    };

    registry.get(&WorkflowId::new(heuristic.unwrap_or(DEFAULT_WORKFLOW)))
}
