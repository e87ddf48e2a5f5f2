//! In-process event bus for processing lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A domain event emitted during document processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier
    pub id: Uuid,
    /// Event type (e.g., "document.uploaded", "workflow.completed")
    pub event_type: String,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// Event payload
    pub payload: serde_json::Value,
    /// Event metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Event {
    /// Create a new event with the given type and payload.
    pub fn new<T: Serialize>(event_type: impl Into<String>, payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the event.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check whether the event matches a type pattern.
    ///
    /// Supports `*` (everything) and `prefix.*` wildcards.
    pub fn matches(&self, pattern: &str) -> bool {
        if pattern == "*" {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix(".*") {
            return self
                .event_type
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.'));
        }
        self.event_type == pattern
    }
}

/// Broadcast-backed event bus.
///
/// Subscribers that lag behind drop events rather than applying
/// backpressure to publishers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Returns the number of active subscribers.
    pub fn publish(&self, event: Event) -> usize {
        let event_type = event.event_type.clone();
        match self.sender.send(event) {
            Ok(n) => {
                tracing::debug!(event_type = %event_type, subscribers = n, "Event published");
                n
            }
            // No active subscribers; not an error
            Err(_) => 0,
        }
    }

    /// Subscribe to all events on the bus.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_matches_exact() {
        let event = Event::new("workflow.completed", serde_json::json!({}));
        assert!(event.matches("workflow.completed"));
        assert!(!event.matches("workflow.failed"));
    }

    #[test]
    fn test_event_matches_wildcards() {
        let event = Event::new("workflow.step_completed", serde_json::json!({}));
        assert!(event.matches("*"));
        assert!(event.matches("workflow.*"));
        assert!(!event.matches("document.*"));
        // "workflow" as a prefix must stop at a dot boundary
        assert!(!event.matches("work.*"));
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        let subscribers = bus.publish(Event::new("document.uploaded", serde_json::json!({"id": 1})));
        assert_eq!(subscribers, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, "document.uploaded");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(Event::new("workflow.started", serde_json::json!({}))), 0);
    }
}
