//! Workflow step types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kind of processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Extract text, chunk, embed, and index the document
    ExtractText,
    /// Run entity extraction over the indexed text
    AnalyzeContent,
    /// Notify enabled integrations
    SendNotification,
    /// Persist the accumulated processing summary
    StoreData,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepKind::ExtractText => "extract_text",
            StepKind::AnalyzeContent => "analyze_content",
            StepKind::SendNotification => "send_notification",
            StepKind::StoreData => "store_data",
        };
        write!(f, "{}", s)
    }
}

/// Retry policy for a step.
///
/// The default is a single attempt, matching the system's historical
/// behavior; definitions opt in to retries per step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff_ms: u64,
    /// Backoff multiplier per retry
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 200,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Backoff before the given retry (1-based retry number).
    pub fn backoff(&self, retry: u32) -> Duration {
        let ms = self.initial_backoff_ms as f64 * self.multiplier.powi(retry.saturating_sub(1) as i32);
        Duration::from_millis(ms as u64)
    }
}

/// A step within a workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    /// Step name, unique within the workflow
    pub name: String,
    /// Step kind
    pub kind: StepKind,
    /// Kind-specific configuration
    #[serde(default)]
    pub config: serde_json::Value,
    /// Retry policy
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl StepSpec {
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            kind,
            config: serde_json::Value::Null,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_kind_display() {
        assert_eq!(StepKind::ExtractText.to_string(), "extract_text");
        assert_eq!(StepKind::StoreData.to_string(), "store_data");
    }

    #[test]
    fn test_retry_policy_default_is_single_attempt() {
        assert_eq!(RetryPolicy::default().max_attempts, 1);
    }

    #[test]
    fn test_retry_backoff_grows() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff_ms: 100,
            multiplier: 2.0,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_with_attempts_floor() {
        assert_eq!(RetryPolicy::with_attempts(0).max_attempts, 1);
    }
}
