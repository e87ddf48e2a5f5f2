//! HTTP request handlers.

use crate::{ApiError, ApiResult, AppState};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use base64::Engine;
use docflow_core::{DocumentId, DocumentRecord, Event, ExecutionId, JournalEntry, WorkflowId};
use docflow_extract::Entity;
use docflow_index::SearchHit;
use docflow_integrations::{Integration, IntegrationKind};
use docflow_workflow::{select_workflow, ExecutionState, StepSpec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const DEFAULT_TOP_K: usize = 10;
const MAX_TOP_K: usize = 100;

// ---------------------------------------------------------------------------
// Documents

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    /// Defaults to a guess from the filename extension
    pub content_type: Option<String>,
    pub category: Option<String>,
    pub uploaded_by: Option<String>,
    /// Raw document bytes, base64 encoded
    pub content_base64: String,
    /// Explicit workflow to run instead of the selected one
    pub workflow: Option<String>,
    /// Set to false to store the document without processing it
    #[serde(default = "default_true")]
    pub process: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document: DocumentRecord,
    pub execution: Option<ExecutionState>,
}

pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    if request.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("filename must not be empty".to_string()));
    }

    let content = base64::engine::general_purpose::STANDARD
        .decode(&request.content_base64)
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 content: {}", e)))?;
    if content.is_empty() {
        return Err(ApiError::BadRequest("document content is empty".to_string()));
    }
    let max = state.config.limits.max_document_bytes;
    if content.len() > max {
        return Err(ApiError::PayloadTooLarge(format!(
            "document is {} bytes (max {})",
            content.len(),
            max
        )));
    }

    let content_type = request.content_type.unwrap_or_else(|| {
        mime_guess::from_path(&request.filename)
            .first_or(mime_guess::mime::TEXT_PLAIN)
            .essence_str()
            .to_string()
    });

    let mut record = DocumentRecord::new(&request.filename, content_type, content.len());
    if let Some(user) = request.uploaded_by {
        record = record.with_uploaded_by(user);
    }
    if let Some(category) = request.category {
        record = record.with_category(category);
    }

    state.documents.insert(record.clone(), content).await?;
    state.events.publish(Event::new(
        "document.uploaded",
        serde_json::json!({
            "document_id": record.id,
            "filename": record.filename.clone(),
        }),
    ));
    info!(document_id = %record.id, filename = %record.filename, "Document uploaded");

    let execution = if request.process {
        let explicit = request.workflow.map(WorkflowId::new);
        let definition = select_workflow(&state.workflows, &record, explicit.as_ref())?;
        Some(state.executor.execute(definition, record.id, None).await?)
    } else {
        None
    };

    let document = state.documents.get(record.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse { document, execution }),
    ))
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DocumentRecord>>> {
    Ok(Json(state.documents.list().await?))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DocumentRecord>> {
    let record = state.documents.get(DocumentId::from_uuid(id)).await?;
    Ok(Json(record))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let document_id = DocumentId::from_uuid(id);
    state.documents.delete(document_id).await?;
    let removed_chunks = state.index.delete_document(document_id).await;
    info!(document_id = %document_id, removed_chunks, "Document deleted");
    Ok(Json(serde_json::json!({
        "deleted": true,
        "removed_chunks": removed_chunks,
    })))
}

#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub document_id: DocumentId,
    pub entities: Vec<Entity>,
    pub risk: f64,
    pub model_used: bool,
}

/// Run entity extraction over a document's indexed text on demand.
pub async fn document_entities(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EntitiesResponse>> {
    let document_id = DocumentId::from_uuid(id);
    // 404 for unknown documents before complaining about missing chunks
    state.documents.get(document_id).await?;

    let chunks = state.index.document_chunks(document_id).await;
    if chunks.is_empty() {
        return Err(ApiError::BadRequest(
            "document has not been indexed yet".to_string(),
        ));
    }
    let text = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let outcome = state.extractor.extract(&text).await;
    Ok(Json(EntitiesResponse {
        document_id,
        entities: outcome.entities,
        risk: outcome.risk,
        model_used: outcome.model_used,
    }))
}

// ---------------------------------------------------------------------------
// Search

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
    pub min_score: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub count: usize,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K).min(MAX_TOP_K);

    let embedding = state.embedder.embed(&request.query).await?;
    let hits = state
        .index
        .search(&embedding, top_k, request.min_score)
        .await?;
    let count = hits.len();
    Ok(Json(SearchResponse { hits, count }))
}

// ---------------------------------------------------------------------------
// Workflows and executions

#[derive(Debug, Serialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<StepSpec>,
}

pub async fn list_workflows(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<WorkflowSummary>>> {
    let summaries = state
        .workflows
        .list()
        .iter()
        .map(|w| WorkflowSummary {
            id: w.id.to_string(),
            name: w.name.clone(),
            description: w.description.clone(),
            steps: w.steps.clone(),
        })
        .collect();
    Ok(Json(summaries))
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub document_id: Uuid,
    /// Resume a previous execution instead of starting a new one
    pub execution_id: Option<Uuid>,
}

pub async fn execute_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ExecuteRequest>,
) -> ApiResult<(StatusCode, Json<ExecutionState>)> {
    let workflow_id = WorkflowId::new(id);
    let definition = state.workflows.get(&workflow_id)?;
    let execution_id = request.execution_id.map(ExecutionId::from_uuid);

    let state_snapshot = state
        .executor
        .execute(definition, DocumentId::from_uuid(request.document_id), execution_id)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(state_snapshot)))
}

#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    #[serde(flatten)]
    pub state: ExecutionState,
    pub steps: Vec<JournalEntry>,
}

pub async fn get_execution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExecutionResponse>> {
    let execution_id = ExecutionId::from_uuid(id);
    let snapshot = state.executor.get_state(execution_id).await?;
    let steps = state.executor.step_results(execution_id).await?;
    Ok(Json(ExecutionResponse {
        state: snapshot,
        steps,
    }))
}

// ---------------------------------------------------------------------------
// Integrations

#[derive(Debug, Deserialize)]
pub struct CreateIntegrationRequest {
    pub name: String,
    pub kind: IntegrationKind,
    pub config: serde_json::Value,
}

pub async fn create_integration(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateIntegrationRequest>,
) -> ApiResult<(StatusCode, Json<Integration>)> {
    let integration = state
        .integrations
        .create(Integration::new(request.name, request.kind, request.config))
        .await?;
    info!(id = %integration.id, kind = ?integration.kind, "Integration created");
    Ok((StatusCode::CREATED, Json(integration)))
}

pub async fn list_integrations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Integration>>> {
    Ok(Json(state.integrations.list().await))
}

pub async fn get_integration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Integration>> {
    Ok(Json(state.integrations.get(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateIntegrationRequest {
    pub name: Option<String>,
    pub config: Option<serde_json::Value>,
}

pub async fn update_integration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIntegrationRequest>,
) -> ApiResult<Json<Integration>> {
    let updated = state
        .integrations
        .update(id, request.name, request.config)
        .await?;
    Ok(Json(updated))
}

pub async fn delete_integration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.integrations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_integration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let enabled = state.integrations.toggle(id).await?;
    Ok(Json(serde_json::json!({ "id": id, "enabled": enabled })))
}

pub async fn test_integration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let report = state.dispatcher.test(id).await?;
    Ok(Json(serde_json::to_value(report).map_err(|e| {
        ApiError::Internal(e.to_string())
    })?))
}

// ---------------------------------------------------------------------------
// Slack webhook

/// Inbound Slack events endpoint.
///
/// The signature is verified over the raw body before any parsing.
/// `url_verification` requests are answered with their challenge; every
/// other event is republished on the internal bus.
pub async fn slack_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    let verifier = state
        .slack_verifier
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("slack is not configured".to_string()))?;

    let timestamp = header_str(&headers, "x-slack-request-timestamp")?;
    let signature = header_str(&headers, "x-slack-signature")?;
    verifier.verify(&body, timestamp, signature)?;

    let payload = parse_slack_body(&body)?;

    if payload.get("type").and_then(|t| t.as_str()) == Some("url_verification") {
        let challenge = payload
            .get("challenge")
            .and_then(|c| c.as_str())
            .ok_or_else(|| ApiError::BadRequest("missing challenge".to_string()))?;
        return Ok(Json(serde_json::json!({ "challenge": challenge })));
    }

    let event_type = payload
        .get("event")
        .and_then(|e| e.get("type"))
        .or_else(|| payload.get("type"))
        .and_then(|t| t.as_str())
        .unwrap_or("unknown")
        .to_string();
    state.events.publish(
        Event::new("slack.event", payload).with_metadata("slack_event_type", event_type.clone()),
    );
    info!(slack_event_type = %event_type, "Slack event received");
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
struct SlackInteractionForm {
    payload: String,
}

/// Slack delivers Events API bodies as JSON and interactive-component
/// bodies form encoded, with the JSON in a `payload` field.
fn parse_slack_body(body: &[u8]) -> ApiResult<serde_json::Value> {
    if let Ok(value) = serde_json::from_slice(body) {
        return Ok(value);
    }
    let form: SlackInteractionForm = serde_urlencoded::from_bytes(body)
        .map_err(|e| ApiError::BadRequest(format!("unrecognized webhook body: {}", e)))?;
    serde_json::from_str(&form.payload)
        .map_err(|e| ApiError::BadRequest(format!("invalid interaction payload: {}", e)))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> ApiResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", name)))
}

// ---------------------------------------------------------------------------
// Health

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn readiness_check(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    // The store is the only dependency that could be unready
    state.documents.list().await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_core::{
        AppConfig, DocumentStatus, EventBus, InMemoryDocumentStore, InMemoryStepJournal,
    };
    use docflow_extract::EntityExtractor;
    use docflow_index::{HashEmbeddingProvider, VectorStore};
    use docflow_ingestion::{IngestionPipeline, PipelineConfig};
    use docflow_integrations::{IntegrationRegistry, NotificationDispatcher, SlackVerifier};
    use docflow_workflow::{
        AnalyzeContentHandler, ExtractTextHandler, HandlerSet, SendNotificationHandler,
        StoreDataHandler, WorkflowExecutor, WorkflowRegistry,
    };

    fn test_state() -> Arc<AppState> {
        let config = AppConfig::load_from_env("DOCFLOW_HANDLER_TEST").unwrap();
        let documents: Arc<InMemoryDocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let journal = Arc::new(InMemoryStepJournal::new());
        let index = VectorStore::new();
        let embedder = Arc::new(HashEmbeddingProvider::new(64));
        let extractor = Arc::new(EntityExtractor::patterns_only());
        let events = EventBus::default();
        let integrations = IntegrationRegistry::new();
        let dispatcher = Arc::new(NotificationDispatcher::new(integrations.clone()));

        let pipeline = Arc::new(
            IngestionPipeline::new(PipelineConfig::default(), embedder.clone(), index.clone())
                .unwrap(),
        );
        let handlers = HandlerSet::new()
            .register(Arc::new(ExtractTextHandler::new(
                documents.clone(),
                pipeline,
            )))
            .register(Arc::new(AnalyzeContentHandler::new(
                index.clone(),
                extractor.clone(),
            )))
            .register(Arc::new(SendNotificationHandler::new(
                dispatcher.clone(),
                events.clone(),
            )))
            .register(Arc::new(StoreDataHandler::new(
                documents.clone(),
                journal.clone(),
            )));
        let executor = Arc::new(WorkflowExecutor::new(
            documents.clone(),
            journal.clone(),
            handlers,
            events.clone(),
        ));

        Arc::new(AppState {
            config,
            documents,
            journal,
            index,
            embedder,
            extractor,
            workflows: WorkflowRegistry::new(),
            executor,
            integrations,
            dispatcher,
            slack_verifier: Some(Arc::new(SlackVerifier::new("test-signing-secret"))),
            events,
        })
    }

    fn upload_request(filename: &str, content: &str) -> UploadRequest {
        UploadRequest {
            filename: filename.to_string(),
            content_type: None,
            category: None,
            uploaded_by: None,
            content_base64: base64::engine::general_purpose::STANDARD.encode(content),
            workflow: None,
            process: true,
        }
    }

    #[tokio::test]
    async fn test_upload_runs_selected_workflow() {
        let state = test_state();
        let request = upload_request("notes.txt", "Contact alice@example.com about invoice #123.");

        let (status, Json(response)) =
            upload_document(State(state.clone()), Json(request)).await.unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.document.status, DocumentStatus::Completed);
        let execution = response.execution.unwrap();
        assert_eq!(execution.completed_steps, execution.total_steps);
        assert!(!state.index.document_chunks(response.document.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_processing() {
        let state = test_state();
        let mut request = upload_request("raw.txt", "hold this for later");
        request.process = false;

        let (_, Json(response)) =
            upload_document(State(state), Json(request)).await.unwrap();

        assert_eq!(response.document.status, DocumentStatus::Uploaded);
        assert!(response.execution.is_none());
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_base64() {
        let state = test_state();
        let mut request = upload_request("x.txt", "ignored");
        request.content_base64 = "not//valid!!base64??".to_string();

        let err = upload_document(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized() {
        let state = test_state();
        let big = "x".repeat(state.config.limits.max_document_bytes + 1);
        let request = upload_request("big.txt", &big);

        let err = upload_document(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn test_get_document_not_found() {
        let state = test_state();
        let err = get_document(State(state), Path(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_finds_uploaded_content() {
        let state = test_state();
        let request = upload_request("report.txt", "quarterly revenue projections for 2026");
        upload_document(State(state.clone()), Json(request)).await.unwrap();

        let Json(response) = search(
            State(state),
            Json(SearchRequest {
                query: "quarterly revenue projections for 2026".to_string(),
                top_k: None,
                min_score: None,
            }),
        )
        .await
        .unwrap();

        assert!(response.count >= 1);
        assert!(response.hits[0].score > 0.9);
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query() {
        let state = test_state();
        let err = search(
            State(state),
            Json(SearchRequest {
                query: "   ".to_string(),
                top_k: None,
                min_score: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_document_entities_endpoint() {
        let state = test_state();
        let request = upload_request("inv.txt", "Invoice #10042: total $99.50 due 2026-10-01.");
        let (_, Json(uploaded)) =
            upload_document(State(state.clone()), Json(request)).await.unwrap();

        let Json(response) = document_entities(
            State(state),
            Path(*uploaded.document.id.as_uuid()),
        )
        .await
        .unwrap();

        assert!(!response.entities.is_empty());
        assert!(!response.model_used);
    }

    #[tokio::test]
    async fn test_execute_unknown_workflow_is_404() {
        let state = test_state();
        let err = execute_workflow(
            State(state),
            Path("nope".to_string()),
            Json(ExecuteRequest {
                document_id: Uuid::new_v4(),
                execution_id: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_execution_lookup_roundtrip() {
        let state = test_state();
        let request = upload_request("doc.txt", "plain content for execution lookup");
        let (_, Json(uploaded)) =
            upload_document(State(state.clone()), Json(request)).await.unwrap();
        let execution = uploaded.execution.unwrap();

        let Json(response) = get_execution(
            State(state),
            Path(*execution.execution_id.as_uuid()),
        )
        .await
        .unwrap();

        assert_eq!(response.steps.len(), execution.completed_steps);
    }

    #[tokio::test]
    async fn test_integration_crud() {
        let state = test_state();
        let (status, Json(created)) = create_integration(
            State(state.clone()),
            Json(CreateIntegrationRequest {
                name: "team channel".to_string(),
                kind: IntegrationKind::Slack,
                config: serde_json::json!({"channel": "#docs"}),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(listed) = list_integrations(State(state.clone())).await.unwrap();
        assert_eq!(listed.len(), 1);

        let Json(toggled) = toggle_integration(State(state.clone()), Path(created.id))
            .await
            .unwrap();
        assert_eq!(toggled["enabled"], serde_json::json!(false));

        let status = delete_integration(State(state.clone()), Path(created.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_integration(State(state), Path(created.id)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_integration_invalid_config_rejected() {
        let state = test_state();
        let err = create_integration(
            State(state),
            Json(CreateIntegrationRequest {
                name: "broken".to_string(),
                kind: IntegrationKind::Slack,
                config: serde_json::json!({}),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    fn slack_headers(body: &str) -> HeaderMap {
        let timestamp = chrono::Utc::now().timestamp();
        let verifier = SlackVerifier::new("test-signing-secret");
        let signature = verifier.sign(timestamp, body.as_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-slack-request-timestamp",
            timestamp.to_string().parse().unwrap(),
        );
        headers.insert("x-slack-signature", signature.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_slack_url_verification() {
        let state = test_state();
        let body = r#"{"type":"url_verification","challenge":"abc123"}"#;
        let headers = slack_headers(body);

        let Json(response) = slack_webhook(
            State(state),
            headers,
            Bytes::from(body.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(response["challenge"], "abc123");
    }

    #[tokio::test]
    async fn test_slack_event_republished() {
        let state = test_state();
        let mut receiver = state.events.subscribe();
        let body = r#"{"type":"event_callback","event":{"type":"message","text":"hi"}}"#;
        let headers = slack_headers(body);

        let Json(response) = slack_webhook(
            State(state),
            headers,
            Bytes::from(body.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(response["ok"], serde_json::json!(true));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type, "slack.event");
    }

    #[tokio::test]
    async fn test_slack_interaction_form_payload_accepted() {
        let state = test_state();
        let mut receiver = state.events.subscribe();
        let interaction =
            r#"{"type":"block_actions","user":{"id":"U123"},"actions":[{"action_id":"approve"}]}"#;
        let body = serde_urlencoded::to_string(&[("payload", interaction)]).unwrap();
        let headers = slack_headers(&body);

        let Json(response) = slack_webhook(
            State(state),
            headers,
            Bytes::from(body),
        )
        .await
        .unwrap();
        assert_eq!(response["ok"], serde_json::json!(true));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type, "slack.event");
        assert_eq!(
            event.metadata.get("slack_event_type").map(String::as_str),
            Some("block_actions")
        );
    }

    #[tokio::test]
    async fn test_slack_unparseable_body_rejected() {
        let state = test_state();
        let body = "neither json nor a form payload";
        let headers = slack_headers(body);

        let err = slack_webhook(State(state), headers, Bytes::from(body))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_slack_bad_signature_rejected() {
        let state = test_state();
        let body = r#"{"type":"event_callback"}"#;
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut headers = HeaderMap::new();
        headers.insert("x-slack-request-timestamp", timestamp.parse().unwrap());
        headers.insert(
            "x-slack-signature",
            "v0=0000000000000000000000000000000000000000000000000000000000000000"
                .parse()
                .unwrap(),
        );

        let err = slack_webhook(State(state), headers, Bytes::from(body.to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_slack_missing_headers_rejected() {
        let state = test_state();
        let err = slack_webhook(State(state), HeaderMap::new(), Bytes::from_static(b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_delete_document_removes_chunks() {
        let state = test_state();
        let request = upload_request("gone.txt", "content that will be deleted shortly");
        let (_, Json(uploaded)) =
            upload_document(State(state.clone()), Json(request)).await.unwrap();
        let id = *uploaded.document.id.as_uuid();

        let Json(response) = delete_document(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(response["deleted"], serde_json::json!(true));
        assert!(response["removed_chunks"].as_u64().unwrap() >= 1);

        let err = get_document(State(state), Path(id)).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
