#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use inmo_api::auth::jwt::{generate_access_token, JwtConfig};
use inmo_api::auth::password::hash_password;
use inmo_api::cache::SponsorCache;
use inmo_api::config::ServerConfig;
use inmo_api::router::build_app_router;
use inmo_api::state::AppState;
use inmo_api::storage::LocalStorage;
use inmo_api::ws::{self, WsManager, WsNotificationSink};
use inmo_db::models::profile::{AdminUpdateUser, Profile};
use inmo_db::models::tier_assignment::AssignTier;
use inmo_db::models::user::NewAccount;
use inmo_db::repositories::{ProfileRepo, TierAssignmentRepo, TierRepo, UserRepo};
use inmo_events::{EventBus, Notifier};

pub const TEST_PASSWORD: &str = "Sup3r-secret-pass";
pub const SUPER_ADMIN_EMAIL: &str = "owner@inmo.test";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uploads go to a fresh directory under the system temp dir.
pub fn test_config() -> ServerConfig {
    let storage_root = std::env::temp_dir().join(format!("inmo-test-{}", uuid::Uuid::new_v4()));
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-key-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        super_admin_email: Some(SUPER_ADMIN_EMAIL.to_string()),
        storage_root: storage_root.to_string_lossy().into_owned(),
        public_base_url: "http://localhost:3000".to_string(),
        whatsapp_number: Some("+502 5555 0100".to_string()),
        contact_email: Some("ventas@inmo.test".to_string()),
        paypal_handle: None,
        binance_pay_id: None,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// The background services from `main` run too: the notifier, the sponsor
/// cache follower and the change forwarder. Heartbeats and session cleanup
/// do not.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let storage = Arc::new(LocalStorage::new(
        &config.storage_root,
        &config.public_base_url,
    ));
    let ws_manager = Arc::new(WsManager::new());
    let event_bus = Arc::new(EventBus::default());
    let sponsor_cache = Arc::new(SponsorCache::new());

    tokio::spawn(Notifier::run(
        pool.clone(),
        event_bus.subscribe(),
        Arc::new(WsNotificationSink(Arc::clone(&ws_manager))),
    ));
    ws::start_change_forwarder(Arc::clone(&ws_manager), event_bus.subscribe_changes());
    let cache = Arc::clone(&sponsor_cache);
    let (cache_pool, changes) = (pool.clone(), event_bus.subscribe_changes());
    tokio::spawn(async move { cache.run(cache_pool, changes).await });

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager,
        event_bus,
        storage,
        sponsor_cache,
    };

    build_app_router(state, &config)
}

/// Serve `app` on an ephemeral local port, for clients that need a real
/// socket (WebSocket upgrades).
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Poll `check` until it returns `true`, for effects applied by background
/// services. Panics after two seconds.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..40 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached in time");
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Upload one file as the `file` field of a multipart form.
pub async fn post_file_auth(
    app: Router,
    uri: &str,
    filename: &str,
    bytes: &[u8],
    token: &str,
) -> Response<Body> {
    const BOUNDARY: &str = "inmo-test-boundary";
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create an identity and profile directly in the database.
pub async fn create_account(pool: &PgPool, email: &str, user_type: &str) -> Profile {
    let account = UserRepo::register(
        pool,
        &NewAccount {
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            full_name: "Test Person".to_string(),
            phone: None,
            user_type: user_type.to_string(),
            pending_user_type: None,
        },
    )
    .await
    .expect("account creation should succeed");
    account.profile
}

/// Create an account with `role = 'admin'`.
pub async fn create_admin(pool: &PgPool, email: &str) -> Profile {
    let profile = create_account(pool, email, "admin").await;
    ProfileRepo::admin_update(
        pool,
        profile.id,
        &AdminUpdateUser {
            role: Some("admin".to_string()),
            user_type: None,
            is_active: None,
        },
    )
    .await
    .expect("role update should succeed")
    .expect("profile should exist")
}

/// Assign the named tier to an agent, as an admin would.
pub async fn assign_tier(pool: &PgPool, agent_id: i64, tier_name: &str) {
    let tier = TierRepo::find_by_name(pool, tier_name)
        .await
        .unwrap()
        .expect("tier should be seeded");
    TierAssignmentRepo::assign(
        pool,
        &AssignTier {
            agent_id,
            tier_id: tier.id,
            billing_period: "monthly".to_string(),
            assigned_by: None,
        },
    )
    .await
    .unwrap()
    .expect("agent should exist");
}

/// Sign an access token for `profile` with the test JWT secret.
pub fn token_for(profile: &Profile) -> String {
    generate_access_token(profile.user_id, profile.id, &test_config().jwt)
        .expect("token generation should succeed")
}

/// A minimal valid listing body.
pub fn listing_body(title: &str, price: i64, location: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "price": price,
        "location": location,
        "property_type": "house",
        "operation": "sale",
        "bedrooms": 3,
        "bathrooms": 2,
    })
}
