//! WebSocket infrastructure: connection registry, channel subscriptions,
//! heartbeat, and the relay from the event bus to clients.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

pub use forwarder::start_change_forwarder;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{KeepaliveSweep, WsManager, WsNotificationSink};
