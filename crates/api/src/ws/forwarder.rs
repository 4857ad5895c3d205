use std::sync::Arc;

use inmo_core::change_feed::RowChange;
use tokio::sync::broadcast;

use crate::ws::manager::WsManager;

/// Relay row changes from the event bus to subscribed WebSocket clients.
///
/// Stops when the bus is dropped.
pub fn start_change_forwarder(
    ws_manager: Arc<WsManager>,
    mut receiver: broadcast::Receiver<RowChange>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(change) => {
                    let reached = ws_manager.publish_change(&change).await;
                    tracing::trace!(table = %change.table, id = change.id, reached, "Forwarded row change");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Change forwarder lagged, clients missed updates");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, change forwarder stopping");
                    break;
                }
            }
        }
    })
}
