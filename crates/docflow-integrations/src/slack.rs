//! Slack request verification and message posting.

use crate::{IntegrationError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Verifies Slack request signatures.
///
/// Slack signs `v0:{timestamp}:{body}` with the app's signing secret and
/// sends the hex digest as `x-slack-signature: v0=<hex>` alongside
/// `x-slack-request-timestamp`.
pub struct SlackVerifier {
    signing_secret: Vec<u8>,
    /// Maximum accepted clock skew in seconds
    tolerance_seconds: i64,
}

impl SlackVerifier {
    pub fn new(signing_secret: &str) -> Self {
        Self {
            signing_secret: signing_secret.as_bytes().to_vec(),
            tolerance_seconds: 300,
        }
    }

    pub fn with_tolerance(mut self, seconds: i64) -> Self {
        self.tolerance_seconds = seconds;
        self
    }

    /// Verify a request against its signature headers.
    pub fn verify(&self, body: &[u8], timestamp_header: &str, signature_header: &str) -> Result<()> {
        let timestamp: i64 = timestamp_header.parse().map_err(|_| {
            IntegrationError::SignatureVerification("invalid timestamp header".to_string())
        })?;

        let skew = (chrono::Utc::now().timestamp() - timestamp).abs();
        if skew > self.tolerance_seconds {
            return Err(IntegrationError::StaleTimestamp(skew));
        }

        let expected = self.compute(timestamp, body);
        let provided = signature_header.strip_prefix("v0=").ok_or_else(|| {
            IntegrationError::SignatureVerification("missing v0 prefix".to_string())
        })?;

        if !constant_time_eq(provided, &expected) {
            return Err(IntegrationError::SignatureVerification(
                "signature mismatch".to_string(),
            ));
        }

        debug!("Slack signature verified");
        Ok(())
    }

    /// Compute the hex digest for a timestamp and body.
    pub fn compute(&self, timestamp: i64, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .expect("HMAC accepts any key length");
        mac.update(format!("v0:{}:", timestamp).as_bytes());
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Produce the header value Slack would send for this payload.
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> String {
        format!("v0={}", self.compute(timestamp, body))
    }
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Posts messages to Slack via chat.postMessage.
pub struct SlackNotifier {
    client: reqwest::Client,
    bot_token: String,
    api_url: String,
}

impl SlackNotifier {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token: bot_token.into(),
            api_url: "https://slack.com/api/chat.postMessage".to_string(),
        }
    }

    /// Override the API URL (used by tests).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Apply a client-side timeout to every Slack API call.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    /// Post a message to a channel.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.bot_token)
            .json(&serde_json::json!({ "channel": channel, "text": text }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IntegrationError::DeliveryFailed(format!(
                "slack returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let error = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            return Err(IntegrationError::DeliveryFailed(format!(
                "slack error: {}",
                error
            )));
        }

        Ok(())
    }
}
