//! Turns domain events into in-app notifications.
//!
//! [`Notifier`] subscribes to the [`EventBus`](crate::bus::EventBus), writes
//! one `notifications` row for the event's target profile and hands the
//! stored row to a [`NotificationSink`] for live delivery (the WebSocket
//! manager in the API). Events without a target are ignored.

use std::sync::Arc;

use inmo_db::models::notification::{CreateNotification, Notification};
use inmo_db::repositories::NotificationRepo;
use inmo_db::DbPool;
use inmo_core::types::DbId;
use tokio::sync::broadcast;

use crate::bus::{event_types, PlatformEvent};

/// Live delivery of a stored notification to a connected profile.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, profile_id: DbId, notification: &Notification);
}

/// Background service that persists and pushes notifications.
pub struct Notifier;

impl Notifier {
    /// Run the notification loop until the bus is dropped.
    pub async fn run(
        pool: DbPool,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        sink: Arc<dyn NotificationSink>,
    ) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let Some(input) = render(&event) else {
                        continue;
                    };
                    match NotificationRepo::create(&pool, &input).await {
                        Ok(notification) => sink.deliver(input.profile_id, &notification),
                        Err(e) => tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            profile_id = input.profile_id,
                            "Failed to store notification"
                        ),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notifier lagged, some notifications were lost");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notifier shutting down");
                    break;
                }
            }
        }
    }
}

/// Build the notification for an event, or `None` when the event has no
/// target or is not user-facing.
pub fn render(event: &PlatformEvent) -> Option<CreateNotification> {
    let profile_id = event.target_profile_id?;
    let text = |key: &str| event.payload.get(key).and_then(|v| v.as_str()).map(str::to_string);

    let (title, body, link) = match event.event_type.as_str() {
        event_types::REGISTRATION_APPROVED => (
            "Tu registro como agente fue aprobado".to_string(),
            Some("Elige un plan para empezar a publicar propiedades.".to_string()),
            Some("/subscription".to_string()),
        ),
        event_types::REGISTRATION_REJECTED => (
            "Tu registro como agente fue rechazado".to_string(),
            text("reason"),
            Some("/profile".to_string()),
        ),
        event_types::TIER_ASSIGNED => (
            format!(
                "Se te asignó el plan {}",
                text("tier_name").unwrap_or_else(|| "nuevo".to_string())
            ),
            None,
            Some("/dashboard".to_string()),
        ),
        event_types::TIER_REVOKED => (
            "Tu plan asignado fue retirado".to_string(),
            None,
            Some("/subscription".to_string()),
        ),
        event_types::SUBSCRIPTION_ACTIVATED => (
            match text("tier_name") {
                Some(name) => format!("Suscripción {name} activada"),
                None => "Suscripción activada".to_string(),
            },
            text("period_end").map(|end| format!("Vigente hasta {end}.")),
            Some("/dashboard".to_string()),
        ),
        event_types::PROPERTY_PAUSED_BY_ADMIN => (
            format!(
                "Tu propiedad \"{}\" fue pausada por un administrador",
                text("title").unwrap_or_default()
            ),
            None,
            Some("/dashboard".to_string()),
        ),
        event_types::PROPERTY_DELETED_BY_ADMIN => (
            format!(
                "Tu propiedad \"{}\" fue eliminada por un administrador",
                text("title").unwrap_or_default()
            ),
            None,
            Some("/dashboard".to_string()),
        ),
        event_types::MESSAGE_RECEIVED => (
            format!(
                "Nuevo mensaje de {}",
                text("sender_name").unwrap_or_else(|| "un usuario".to_string())
            ),
            text("preview"),
            event
                .actor_profile_id
                .map(|sender| format!("/messages?with={sender}")),
        ),
        _ => return None,
    };

    Some(CreateNotification {
        profile_id,
        kind: event.event_type.clone(),
        title,
        body,
        link,
    })
}
