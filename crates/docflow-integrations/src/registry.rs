//! Integration registry.

use crate::{IntegrationError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Kind of notification integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationKind {
    Slack,
    Email,
    Webhook,
    Database,
}

/// A configured integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    /// Integration identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Integration kind
    pub kind: IntegrationKind,
    /// Kind-specific configuration (channel, url, address, ...)
    pub config: serde_json::Value,
    /// Whether the integration receives notifications
    pub enabled: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Integration {
    pub fn new(name: impl Into<String>, kind: IntegrationKind, config: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            config,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    /// Validate the kind-specific configuration.
    pub fn validate(&self) -> Result<()> {
        let required = match self.kind {
            IntegrationKind::Slack => "channel",
            IntegrationKind::Email => "address",
            IntegrationKind::Webhook => "url",
            IntegrationKind::Database => "table",
        };
        if self.config.get(required).and_then(|v| v.as_str()).is_none() {
            return Err(IntegrationError::InvalidConfig(format!(
                "{:?} integration requires a '{}' field",
                self.kind, required
            )));
        }
        Ok(())
    }
}

/// Concurrent registry of integrations.
#[derive(Clone, Default)]
pub struct IntegrationRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Integration>>>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new integration after validating its config.
    pub async fn create(&self, integration: Integration) -> Result<Integration> {
        integration.validate()?;
        let mut inner = self.inner.write().await;
        inner.insert(integration.id, integration.clone());
        info!(id = %integration.id, kind = ?integration.kind, "Integration created");
        Ok(integration)
    }

    pub async fn get(&self, id: Uuid) -> Result<Integration> {
        let inner = self.inner.read().await;
        inner
            .get(&id)
            .cloned()
            .ok_or_else(|| IntegrationError::NotFound(id.to_string()))
    }

    /// All integrations, oldest first.
    pub async fn list(&self) -> Vec<Integration> {
        let inner = self.inner.read().await;
        let mut all: Vec<_> = inner.values().cloned().collect();
        all.sort_by_key(|i| i.created_at);
        all
    }

    /// Enabled integrations only.
    pub async fn enabled(&self) -> Vec<Integration> {
        self.list().await.into_iter().filter(|i| i.enabled).collect()
    }

    /// Replace an integration's name and config.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        config: Option<serde_json::Value>,
    ) -> Result<Integration> {
        let mut inner = self.inner.write().await;
        let integration = inner
            .get_mut(&id)
            .ok_or_else(|| IntegrationError::NotFound(id.to_string()))?;

        // Validate on a candidate so a rejected update leaves the original intact
        let mut candidate = integration.clone();
        if let Some(name) = name {
            candidate.name = name;
        }
        if let Some(config) = config {
            candidate.config = config;
        }
        candidate.validate()?;

        *integration = candidate.clone();
        Ok(candidate)
    }

    /// Flip the enabled flag. Returns the new state.
    pub async fn toggle(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let integration = inner
            .get_mut(&id)
            .ok_or_else(|| IntegrationError::NotFound(id.to_string()))?;
        integration.enabled = !integration.enabled;
        info!(id = %id, enabled = integration.enabled, "Integration toggled");
        Ok(integration.enabled)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .remove(&id)
            .ok_or_else(|| IntegrationError::NotFound(id.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slack_integration() -> Integration {
        Integration::new(
            "team-alerts",
            IntegrationKind::Slack,
            serde_json::json!({"channel": "#alerts"}),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = IntegrationRegistry::new();
        let created = registry.create(slack_integration()).await.unwrap();

        let fetched = registry.get(created.id).await.unwrap();
        assert_eq!(fetched.name, "team-alerts");
        assert!(fetched.enabled);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_config() {
        let registry = IntegrationRegistry::new();
        let bad = Integration::new("no-channel", IntegrationKind::Slack, serde_json::json!({}));

        assert!(matches!(
            registry.create(bad).await.unwrap_err(),
            IntegrationError::InvalidConfig(_)
        ));
    }

    #[tokio::test]
    async fn test_toggle() {
        let registry = IntegrationRegistry::new();
        let created = registry.create(slack_integration()).await.unwrap();

        assert!(!registry.toggle(created.id).await.unwrap());
        assert!(registry.enabled().await.is_empty());

        assert!(registry.toggle(created.id).await.unwrap());
        assert_eq!(registry.enabled().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_validates() {
        let registry = IntegrationRegistry::new();
        let created = registry.create(slack_integration()).await.unwrap();

        let err = registry
            .update(created.id, None, Some(serde_json::json!({"wrong": true})))
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let registry = IntegrationRegistry::new();
        assert!(matches!(
            registry.delete(Uuid::new_v4()).await.unwrap_err(),
            IntegrationError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_webhook_requires_url() {
        let registry = IntegrationRegistry::new();
        let ok = Integration::new(
            "hook",
            IntegrationKind::Webhook,
            serde_json::json!({"url": "https://example.com/hook"}),
        );
        assert!(registry.create(ok).await.is_ok());
    }
}
