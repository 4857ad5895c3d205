use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

const KEEPALIVE_EVERY: Duration = Duration::from_secs(30);

/// Periodically ping feed viewers and prune connections that went away
/// without a Close frame. Runs until the handle is aborted.
pub fn start_heartbeat(ws_manager: Arc<WsManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(KEEPALIVE_EVERY);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let sweep = ws_manager.keepalive().await;
            if sweep.dropped > 0 {
                tracing::info!(dropped = sweep.dropped, "Pruned stale WebSocket connections");
            }
            tracing::debug!(
                pinged = sweep.pinged,
                signed_in = sweep.signed_in,
                "WebSocket keepalive"
            );
        }
    })
}
