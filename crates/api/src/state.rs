use std::sync::Arc;

use crate::cache::SponsorCache;
use crate::config::ServerConfig;
use crate::storage::StorageProvider;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: inmo_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Domain events and row changes.
    pub event_bus: Arc<inmo_events::EventBus>,
    /// Object storage for listing photos and sponsor logos.
    pub storage: Arc<dyn StorageProvider>,
    /// Public sponsor list, kept current from row changes.
    pub sponsor_cache: Arc<SponsorCache>,
}
