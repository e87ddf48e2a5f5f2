//! Notification integrations and inbound webhook verification.
//!
//! This crate provides:
//! - An integration registry (Slack, email, webhook, database) with
//!   enable/disable toggles and connectivity tests
//! - Slack request signature verification (HMAC-SHA256, `v0` scheme)
//! - A notification dispatcher that fans out to enabled integrations

pub mod notifier;
pub mod registry;
pub mod slack;

pub use notifier::{DispatchReport, NotificationDispatcher, Notification};
pub use registry::{Integration, IntegrationKind, IntegrationRegistry};
pub use slack::{SlackNotifier, SlackVerifier};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("Integration not found: {0}")]
    NotFound(String),

    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),

    #[error("Stale request timestamp: {0}s outside tolerance")]
    StaleTimestamp(i64),

    #[error("Invalid integration config: {0}")]
    InvalidConfig(String),

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, IntegrationError>;
