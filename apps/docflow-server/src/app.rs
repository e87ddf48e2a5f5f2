//! Application state and initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use docflow_api::AppState;
use docflow_core::{
    AppConfig, DocumentStore, EventBus, InMemoryDocumentStore, InMemoryStepJournal, StepJournal,
};
use docflow_extract::{EntityExtractor, ExtractorConfig, HttpNerClient};
use docflow_index::{EmbeddingProvider, HashEmbeddingProvider, HttpEmbeddingClient, VectorStore};
use docflow_ingestion::{IngestionPipeline, PipelineConfig};
use docflow_integrations::{
    IntegrationRegistry, NotificationDispatcher, SlackNotifier, SlackVerifier,
};
use docflow_workflow::{
    AnalyzeContentHandler, ExtractTextHandler, HandlerSet, SendNotificationHandler,
    StoreDataHandler, WorkflowExecutor, WorkflowRegistry,
};

use crate::cli::Args;
use crate::server::Server;

/// Wire up the full application state from configuration.
pub fn build_state(config: AppConfig) -> Result<AppState> {
    info!("Initializing application components");

    let documents: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let journal: Arc<dyn StepJournal> = Arc::new(InMemoryStepJournal::new());
    let index = VectorStore::new();
    let events = EventBus::default();
    let timeout = config.limits.request_timeout();

    let embedder: Arc<dyn EmbeddingProvider> = if config.embedding.endpoint.is_empty() {
        info!(
            dimension = config.embedding.dimension,
            "Using offline embedding provider"
        );
        Arc::new(HashEmbeddingProvider::new(config.embedding.dimension))
    } else {
        info!(endpoint = %config.embedding.endpoint, model = %config.embedding.model, "Using HTTP embedding provider");
        Arc::new(
            HttpEmbeddingClient::new(
                &config.embedding.endpoint,
                &config.embedding.model,
                &config.embedding.api_key,
                config.embedding.dimension,
            )
            .with_timeout(timeout),
        )
    };

    let extractor = if config.ner.endpoint.is_empty() {
        info!("Entity extraction runs in patterns-only mode");
        Arc::new(EntityExtractor::patterns_only())
    } else {
        info!(endpoint = %config.ner.endpoint, "Entity extraction uses the NER model");
        Arc::new(EntityExtractor::new(
            ExtractorConfig {
                window_chars: config.ner.window_chars,
                risk_threshold: config.ner.risk_threshold,
                ..ExtractorConfig::default()
            },
            Arc::new(
                HttpNerClient::new(&config.ner.endpoint, &config.ner.api_key)
                    .with_timeout(timeout),
            ),
        ))
    };

    let integrations = IntegrationRegistry::new();
    let mut dispatcher = NotificationDispatcher::new(integrations.clone()).with_timeout(timeout);
    if !config.slack.bot_token.is_empty() {
        dispatcher = dispatcher
            .with_slack(SlackNotifier::new(&config.slack.bot_token).with_timeout(timeout));
    }
    let dispatcher = Arc::new(dispatcher);

    let slack_verifier = if config.slack.signing_secret.is_empty() {
        None
    } else {
        Some(Arc::new(SlackVerifier::new(&config.slack.signing_secret)))
    };

    let pipeline = Arc::new(
        IngestionPipeline::new(
            PipelineConfig {
                max_document_bytes: config.limits.max_document_bytes,
                ..PipelineConfig::default()
            },
            embedder.clone(),
            index.clone(),
        )
        .context("Failed to build ingestion pipeline")?,
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

    Ok(AppState {
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
        slack_verifier,
        events,
    })
}

/// Main application
pub struct App {
    args: Args,
    state: AppState,
}

impl App {
    /// Build the application with all dependencies
    pub async fn build(args: Args) -> Result<Self> {
        let config = if args.config.exists() {
            let path = args.config.to_string_lossy();
            info!(config = %path, "Loading configuration file");
            AppConfig::load_from_file(&path)
        } else {
            AppConfig::load()
        }
        .context("Failed to load configuration")?;

        let state = build_state(config)?;

        Ok(Self { args, state })
    }

    /// Run the application until shutdown
    pub async fn run(self) -> Result<()> {
        let port = self.args.port.unwrap_or(self.state.config.server.port);
        info!("Starting server");
        info!("HTTP port: {}", port);

        let server = Server::new(port, self.state);
        server.run().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_state_with_defaults() {
        let config = AppConfig::load_from_env("DOCFLOW_APP_TEST").unwrap();
        let state = build_state(config).unwrap();

        assert!(state.slack_verifier.is_none());
        assert_eq!(state.workflows.list().len(), 4);
    }

    #[tokio::test]
    async fn test_build_state_with_http_endpoints() {
        // HTTP clients are built with the configured request timeout
        let mut config = AppConfig::load_from_env("DOCFLOW_APP_HTTP_TEST").unwrap();
        config.embedding.endpoint = "http://localhost:9/embeddings".to_string();
        config.ner.endpoint = "http://localhost:9/ner".to_string();
        config.slack.bot_token = "xoxb-test".to_string();
        config.slack.signing_secret = "test-secret".to_string();
        config.limits.request_timeout_secs = 5;

        let state = build_state(config).unwrap();
        assert!(state.slack_verifier.is_some());
        assert_eq!(state.config.limits.request_timeout().as_secs(), 5);
    }
}
