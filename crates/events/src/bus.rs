//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`ResourceEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use testbed_core::types::DbId;

// ---------------------------------------------------------------------------
// ResourceEvent
// ---------------------------------------------------------------------------

/// A lifecycle event emitted by the registry.
///
/// Constructed via [`ResourceEvent::new`] and enriched with the builder
/// methods [`with_resource`](ResourceEvent::with_resource) and
/// [`with_payload`](ResourceEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEvent {
    /// Dot-separated event name, e.g. `"resource.committed"`.
    pub event_type: String,

    /// Kind token of the resource the event concerns (e.g. `"queue"`).
    pub resource_kind: Option<String>,

    /// Database id of the resource the event concerns.
    pub resource_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data
    /// (e.g. the committed version number).
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ResourceEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            resource_kind: None,
            resource_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the subject resource to the event.
    pub fn with_resource(mut self, kind: impl Into<String>, id: DbId) -> Self {
        self.resource_kind = Some(kind.into());
        self.resource_id = Some(id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ResourceEvent`].
pub struct EventBus {
    sender: broadcast::Sender<ResourceEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: ResourceEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
