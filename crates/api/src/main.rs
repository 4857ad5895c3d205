use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inmo_api::cache::SponsorCache;
use inmo_api::config::ServerConfig;
use inmo_api::router::build_app_router;
use inmo_api::state::AppState;
use inmo_api::storage::LocalStorage;
use inmo_api::ws;
use inmo_db::repositories::SessionRepo;

/// How often expired and revoked refresh sessions are purged.
const SESSION_CLEANUP_INTERVAL_SECS: u64 = 3600;
/// How long redeemed or expired sessions are kept before purging.
const SESSION_RETENTION_HOURS: i64 = 24;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inmo_api=debug,inmo_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    if config.super_admin_email.is_none() {
        tracing::warn!("SUPER_ADMIN_EMAIL is not set; no account bypasses the publication gate");
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = inmo_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    inmo_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    inmo_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Storage ---
    tokio::fs::create_dir_all(&config.storage_root)
        .await
        .expect("Failed to create storage root");
    let storage = Arc::new(LocalStorage::new(
        &config.storage_root,
        &config.public_base_url,
    ));

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(inmo_events::EventBus::default());

    let notifier_handle = tokio::spawn(inmo_events::Notifier::run(
        pool.clone(),
        event_bus.subscribe(),
        Arc::new(ws::WsNotificationSink(Arc::clone(&ws_manager))),
    ));
    let forwarder_handle =
        ws::start_change_forwarder(Arc::clone(&ws_manager), event_bus.subscribe_changes());

    // --- Sponsor cache ---
    let sponsor_cache = Arc::new(SponsorCache::new());
    let loaded = sponsor_cache
        .load(&pool)
        .await
        .expect("Failed to load sponsors");
    tracing::info!(loaded, "Sponsor cache loaded");
    let cache_handle = {
        let cache = Arc::clone(&sponsor_cache);
        let pool = pool.clone();
        let changes = event_bus.subscribe_changes();
        tokio::spawn(async move { cache.run(pool, changes).await })
    };

    // --- Session cleanup ---
    let cleanup_handle = {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(SESSION_CLEANUP_INTERVAL_SECS));
            let retain = chrono::Duration::hours(SESSION_RETENTION_HOURS);
            loop {
                interval.tick().await;
                match SessionRepo::purge_ended(&pool, retain).await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "Ended sessions purged"),
                    Err(e) => tracing::error!(error = %e, "Session cleanup failed"),
                }
            }
        })
    };

    tracing::info!("Background services started (notifier, change forwarder, sponsor cache)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
        storage,
        sponsor_cache,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cleanup_handle.abort();

    // Dropping the last bus handle closes both channels, which stops the
    // notifier, the forwarder and the sponsor cache.
    drop(event_bus);
    for handle in [notifier_handle, forwarder_handle, cache_handle] {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    tracing::info!("Event services shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
