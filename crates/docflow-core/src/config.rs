//! Application configuration.
//!
//! Configuration is loaded from environment variables with the `DOCFLOW`
//! prefix (double underscore separator), optionally layered over a TOML
//! file. Every setting has a development-safe default.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

pub use config::ConfigError;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub ner: NerConfig,
    pub slack: SlackConfig,
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_env("DOCFLOW")
    }

    /// Load configuration from environment with a custom prefix.
    pub fn load_from_env(prefix: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("embedding.endpoint", "")?
            .set_default("embedding.model", "text-embedding-3-small")?
            .set_default("embedding.api_key", "")?
            .set_default("embedding.dimension", 384)?
            .set_default("ner.endpoint", "")?
            .set_default("ner.api_key", "")?
            .set_default("ner.window_chars", 1800)?
            .set_default("ner.risk_threshold", 0.6)?
            .set_default("slack.signing_secret", "")?
            .set_default("slack.bot_token", "")?
            .set_default("limits.max_document_bytes", 50 * 1024 * 1024)?
            .set_default("limits.request_timeout_secs", 30)?;

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a file with environment overrides.
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("DOCFLOW").separator("__"));

        builder.build()?.try_deserialize()
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Embedding provider configuration.
///
/// An empty endpoint selects the deterministic offline provider.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

fn default_dimension() -> usize {
    384
}

/// Named-entity model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NerConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// Maximum characters per model window
    #[serde(default = "default_window_chars")]
    pub window_chars: usize,
    /// Risk score above which the model call is skipped
    #[serde(default = "default_risk_threshold")]
    pub risk_threshold: f64,
}

fn default_window_chars() -> usize {
    1800
}

fn default_risk_threshold() -> f64 {
    0.6
}

/// Slack integration configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub signing_secret: String,
    #[serde(default)]
    pub bot_token: String,
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl LimitsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: default_max_document_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_max_document_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        let config = AppConfig::load_from_env("DOCFLOW_TEST_UNSET").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.ner.window_chars, 1800);
        assert_eq!(config.limits.max_document_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_server_address() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        assert_eq!(server.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_request_timeout() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.request_timeout(), Duration::from_secs(30));
    }
}
