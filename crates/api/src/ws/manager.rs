use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::Message;
use inmo_core::change_feed::RowChange;
use inmo_core::types::{DbId, Timestamp};
use inmo_db::models::notification::Notification;
use inmo_events::NotificationSink;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Frames the server pushes to clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    Subscribed { channel: &'a str },
    Unsubscribed { channel: &'a str },
    Change(&'a RowChange),
    Notification { data: &'a Notification },
    Error { message: String },
}

impl ServerMessage<'_> {
    pub fn to_message(&self) -> Message {
        let text = serde_json::to_string(self).unwrap_or_default();
        Message::Text(text.into())
    }
}

/// Outcome of one [`WsManager::keepalive`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveSweep {
    pub pinged: usize,
    pub dropped: usize,
    /// Live connections that carry a profile's notifications.
    pub signed_in: usize,
}

pub struct WsConnection {
    /// Signed-in profile, `None` for anonymous feed viewers.
    pub profile_id: Option<DbId>,
    /// Change-feed channels (table names) this connection follows.
    pub channels: HashSet<String>,
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// All live WebSocket connections, keyed by connection id.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection and return the receiver its sender task drains.
    pub async fn add(
        &self,
        conn_id: String,
        profile_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            profile_id,
            channels: HashSet::new(),
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Follow `channel`. Returns `false` if the connection is gone.
    pub async fn subscribe(&self, conn_id: &str, channel: &str) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => {
                conn.channels.insert(channel.to_string());
                true
            }
            None => false,
        }
    }

    pub async fn unsubscribe(&self, conn_id: &str, channel: &str) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => {
                conn.channels.remove(channel);
                true
            }
            None => false,
        }
    }

    /// Send one frame to a single connection.
    pub async fn send_to(&self, conn_id: &str, message: Message) {
        if let Some(conn) = self.connections.read().await.get(conn_id) {
            let _ = conn.sender.send(message);
        }
    }

    pub async fn get_by_profile(&self, profile_id: DbId) -> Vec<String> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(_, conn)| conn.profile_id == Some(profile_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Forward a row change to every connection following its table.
    ///
    /// Returns the number of connections reached.
    pub async fn publish_change(&self, change: &RowChange) -> usize {
        let message = ServerMessage::Change(change).to_message();
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values().filter(|c| c.channels.contains(&change.table)) {
            let _ = conn.sender.send(message.clone());
            count += 1;
        }
        count
    }

    /// Send a frame to every connection of one profile.
    pub async fn send_to_profile(&self, profile_id: DbId, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values().filter(|c| c.profile_id == Some(profile_id)) {
            let _ = conn.sender.send(message.clone());
            count += 1;
        }
        count
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then forget them all.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Ping every connection and forget those whose socket task has ended.
    pub async fn keepalive(&self) -> KeepaliveSweep {
        let mut conns = self.connections.write().await;
        let before = conns.len();
        conns.retain(|_, conn| conn.sender.send(Message::Ping(Bytes::new())).is_ok());
        KeepaliveSweep {
            pinged: conns.len(),
            dropped: before - conns.len(),
            signed_in: conns.values().filter(|c| c.profile_id.is_some()).count(),
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Pushes stored notifications to the recipient's open connections.
pub struct WsNotificationSink(pub Arc<WsManager>);

impl NotificationSink for WsNotificationSink {
    fn deliver(&self, profile_id: DbId, notification: &Notification) {
        let manager = Arc::clone(&self.0);
        let message = ServerMessage::Notification { data: notification }.to_message();
        tokio::spawn(async move {
            let reached = manager.send_to_profile(profile_id, message).await;
            tracing::debug!(profile_id, reached, "Pushed notification");
        });
    }
}

#[cfg(test)]
mod tests {
    use inmo_core::change_feed::{ChangeOp, TABLE_PROPERTIES, TABLE_SPONSORS};

    use super::*;

    fn text(message: Message) -> serde_json::Value {
        match message {
            Message::Text(t) => serde_json::from_str(t.as_str()).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn changes_reach_only_subscribers() {
        let manager = WsManager::new();
        let mut following = manager.add("a".into(), None).await;
        let mut other = manager.add("b".into(), None).await;
        manager.subscribe("a", TABLE_PROPERTIES).await;
        manager.subscribe("b", TABLE_SPONSORS).await;

        let change = RowChange::delete(TABLE_PROPERTIES, 9);
        assert_eq!(manager.publish_change(&change).await, 1);

        let frame = text(following.try_recv().unwrap());
        assert_eq!(frame["type"], "change");
        assert_eq!(frame["table"], "properties");
        assert_eq!(frame["op"], "delete");
        assert_eq!(frame["id"], 9);
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let manager = WsManager::new();
        let mut rx = manager.add("a".into(), None).await;
        manager.subscribe("a", TABLE_PROPERTIES).await;
        manager.unsubscribe("a", TABLE_PROPERTIES).await;

        let change = RowChange::upsert(TABLE_PROPERTIES, ChangeOp::Update, 1, &serde_json::json!({}));
        assert_eq!(manager.publish_change(&change).await, 0);
        assert!(rx.try_recv().is_err());
        assert!(!manager.subscribe("missing", TABLE_PROPERTIES).await);
    }

    #[tokio::test]
    async fn profile_targeting() {
        let manager = WsManager::new();
        let _a = manager.add("a".into(), Some(5)).await;
        let _b = manager.add("b".into(), Some(5)).await;
        let _c = manager.add("c".into(), Some(6)).await;

        let mut ids = manager.get_by_profile(5).await;
        ids.sort();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(manager.send_to_profile(6, Message::Ping(Bytes::new())).await, 1);

        manager.shutdown_all().await;
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn keepalive_drops_finished_connections() {
        let manager = WsManager::new();
        let mut live = manager.add("live".into(), Some(3)).await;
        let gone = manager.add("gone".into(), None).await;
        drop(gone);

        let sweep = manager.keepalive().await;
        assert_eq!(
            sweep,
            KeepaliveSweep {
                pinged: 1,
                dropped: 1,
                signed_in: 1
            }
        );
        assert!(matches!(live.try_recv(), Ok(Message::Ping(_))));
        assert_eq!(manager.connection_count().await, 1);
    }
}
