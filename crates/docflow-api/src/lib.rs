//! REST API surface.
//!
//! This crate provides:
//! - The axum router and all HTTP handlers
//! - `AppState`, the shared handle bundle handlers operate on
//! - `ApiError`, which maps domain errors onto HTTP status codes

pub mod rest;

pub use rest::router::create_router;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use docflow_core::{AppConfig, CoreError, DocumentStore, EventBus, StepJournal};
use docflow_extract::EntityExtractor;
use docflow_index::{EmbeddingProvider, IndexError, VectorStore};
use docflow_ingestion::IngestionError;
use docflow_integrations::{
    IntegrationError, IntegrationRegistry, NotificationDispatcher, SlackVerifier,
};
use docflow_workflow::{WorkflowError, WorkflowExecutor, WorkflowRegistry};
use std::sync::Arc;

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub documents: Arc<dyn DocumentStore>,
    pub journal: Arc<dyn StepJournal>,
    pub index: VectorStore,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub extractor: Arc<EntityExtractor>,
    pub workflows: WorkflowRegistry,
    pub executor: Arc<WorkflowExecutor>,
    pub integrations: IntegrationRegistry,
    pub dispatcher: Arc<NotificationDispatcher>,
    /// Absent when no Slack signing secret is configured
    pub slack_verifier: Option<Arc<SlackVerifier>>,
    pub events: EventBus,
}

/// API-level error, rendered as a JSON body with a matching status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DocumentNotFound(_) => ApiError::NotFound(err.to_string()),
            CoreError::InvalidState(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::UnknownWorkflow(_) | WorkflowError::ExecutionNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            WorkflowError::InvalidDefinition(_) => ApiError::BadRequest(err.to_string()),
            WorkflowError::Store(inner) => inner.into(),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { .. } | IndexError::InvalidVector(_) => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<IngestionError> for ApiError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::DocumentTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            IngestionError::InvalidConfig(_) => ApiError::BadRequest(err.to_string()),
            IngestionError::Store(inner) => inner.into(),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<IntegrationError> for ApiError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::NotFound(_) => ApiError::NotFound(err.to_string()),
            IntegrationError::SignatureVerification(_) | IntegrationError::StaleTimestamp(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            IntegrationError::InvalidConfig(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
