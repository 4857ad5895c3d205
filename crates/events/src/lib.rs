//! Inmo event bus and notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, carrying both domain [`PlatformEvent`]s and
//!   row-level [`RowChange`](inmo_core::change_feed::RowChange)s.
//! - [`Notifier`]: background service that turns domain events into
//!   per-profile notification rows and pushes them to connected clients.

pub mod bus;
pub mod notifier;

pub use bus::{event_types, EventBus, PlatformEvent};
pub use notifier::{NotificationSink, Notifier};
