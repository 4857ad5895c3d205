//! In-process event bus backed by `tokio::sync::broadcast` channels.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application. It
//! has two independent channels: domain events ([`PlatformEvent`]) and the
//! realtime change feed ([`RowChange`]).

use chrono::{DateTime, Utc};
use inmo_core::change_feed::RowChange;
use inmo_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Names of the domain events published by the API.
pub mod event_types {
    pub const REGISTRATION_APPROVED: &str = "registration.approved";
    pub const REGISTRATION_REJECTED: &str = "registration.rejected";
    pub const TIER_ASSIGNED: &str = "tier.assigned";
    pub const TIER_REVOKED: &str = "tier.revoked";
    pub const SUBSCRIPTION_ACTIVATED: &str = "subscription.activated";
    pub const PROPERTY_PAUSED_BY_ADMIN: &str = "property.paused_by_admin";
    pub const PROPERTY_DELETED_BY_ADMIN: &str = "property.deleted_by_admin";
    pub const MESSAGE_RECEIVED: &str = "message.received";
}

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred on the marketplace.
///
/// Constructed via [`PlatformEvent::new`] and enriched with the builder
/// methods [`with_source`](PlatformEvent::with_source),
/// [`with_actor`](PlatformEvent::with_actor),
/// [`with_target`](PlatformEvent::with_target) and
/// [`with_payload`](PlatformEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"registration.approved"`.
    pub event_type: String,

    /// Optional source entity kind (e.g. `"property"`, `"message"`).
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// Profile that triggered the event.
    pub actor_profile_id: Option<DbId>,

    /// Profile the event concerns; receives the notification.
    pub target_profile_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_profile_id: None,
            target_profile_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, profile_id: DbId) -> Self {
        self.actor_profile_id = Some(profile_id);
        self
    }

    pub fn with_target(mut self, profile_id: DbId) -> Self {
        self.target_profile_id = Some(profile_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for each broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When a buffer is full the oldest messages are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    events: broadcast::Sender<PlatformEvent>,
    changes: broadcast::Sender<RowChange>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        let (changes, _) = broadcast::channel(capacity);
        Self { events, changes }
    }

    /// Publish a domain event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: PlatformEvent) {
        // SendError only means there are zero receivers.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.events.subscribe()
    }

    /// Publish a row change on the realtime feed.
    pub fn publish_change(&self, change: RowChange) {
        let _ = self.changes.send(change);
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<RowChange> {
        self.changes.subscribe()
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
