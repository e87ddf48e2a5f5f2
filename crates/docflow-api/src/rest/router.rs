//! Axum router configuration.

use crate::{rest::handlers, AppState};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main API router.
pub fn create_router(state: AppState) -> Router {
    // Uploads arrive base64 encoded inside a JSON envelope, so the body cap
    // must cover the configured document limit plus the 4/3 inflation.
    // Without this, axum's 2 MB default rejects documents the upload
    // handler itself would accept.
    let body_limit = state.config.limits.max_document_bytes / 3 * 4 + 64 * 1024;
    let state = Arc::new(state);

    let api_v1 = Router::new()
        // Document routes
        .route("/documents", post(handlers::upload_document))
        .route("/documents", get(handlers::list_documents))
        .route("/documents/:id", get(handlers::get_document))
        .route("/documents/:id", delete(handlers::delete_document))
        .route("/documents/:id/entities", get(handlers::document_entities))
        // Search
        .route("/search", post(handlers::search))
        // Workflow routes
        .route("/workflows", get(handlers::list_workflows))
        .route("/workflows/:id/execute", post(handlers::execute_workflow))
        .route("/executions/:id", get(handlers::get_execution))
        // Integration routes
        .route("/integrations", post(handlers::create_integration))
        .route("/integrations", get(handlers::list_integrations))
        .route("/integrations/:id", get(handlers::get_integration))
        .route("/integrations/:id", put(handlers::update_integration))
        .route("/integrations/:id", delete(handlers::delete_integration))
        .route("/integrations/:id/toggle", post(handlers::toggle_integration))
        .route("/integrations/:id/test", post(handlers::test_integration))
        // Inbound webhooks
        .route("/webhooks/slack", post(handlers::slack_webhook));

    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(health_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Configure CORS layer
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(
            std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .parse::<HeaderValue>()
                .unwrap_or(HeaderValue::from_static("*")),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-slack-signature"),
            header::HeaderName::from_static("x-slack-request-timestamp"),
        ])
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use docflow_core::{AppConfig, EventBus, InMemoryDocumentStore, InMemoryStepJournal};
    use docflow_extract::EntityExtractor;
    use docflow_index::{HashEmbeddingProvider, VectorStore};
    use docflow_integrations::{IntegrationRegistry, NotificationDispatcher};
    use docflow_workflow::{HandlerSet, WorkflowExecutor, WorkflowRegistry};
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let documents: Arc<InMemoryDocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let journal = Arc::new(InMemoryStepJournal::new());
        let events = EventBus::default();
        let integrations = IntegrationRegistry::new();
        let executor = Arc::new(WorkflowExecutor::new(
            documents.clone(),
            journal.clone(),
            HandlerSet::new(),
            events.clone(),
        ));

        AppState {
            config: AppConfig::load_from_env("DOCFLOW_ROUTER_TEST").unwrap(),
            documents,
            journal,
            index: VectorStore::new(),
            embedder: Arc::new(HashEmbeddingProvider::new(32)),
            extractor: Arc::new(EntityExtractor::patterns_only()),
            workflows: WorkflowRegistry::new(),
            executor,
            integrations: integrations.clone(),
            dispatcher: Arc::new(NotificationDispatcher::new(integrations)),
            slack_verifier: None,
            events,
        }
    }

    #[tokio::test]
    async fn test_health_check_route() {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_route() {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_workflows_route() {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/workflows")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_document_is_404() {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/documents/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_accepts_multi_megabyte_body() {
        use base64::Engine;

        // 3 MB of content becomes a 4 MB request body, which must pass
        // the body cap as long as it stays under the document limit
        let app = create_router(create_test_state());
        let content =
            base64::engine::general_purpose::STANDARD.encode(vec![b'a'; 3 * 1024 * 1024]);
        let body = serde_json::json!({
            "filename": "large.txt",
            "content_base64": content,
            "process": false,
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/documents")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_slack_webhook_unconfigured_is_503() {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/webhooks/slack")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
