pub mod admin;
pub mod auth;
pub mod health;
pub mod marketplace;
pub mod profile;
pub mod property;
pub mod subscription;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                     WebSocket (token optional)
///
/// /auth/signup, /auth/login               public
/// /auth/refresh                           public
/// /auth/logout, /auth/session             requires auth
/// /auth/otp/request, /auth/otp/verify     requires auth
///
/// /profile                                own profile (get, update)
/// /profiles/{id}                          public profile view
/// /agents/{id}/portfolio                  public agent portfolio
///
/// /properties                             feed (public), create (gated)
/// /properties/featured, /search           public
/// /properties/{id}                        get, update, delete
/// /properties/{id}/contact                public contact links
/// /properties/{id}/pause|activate|promote status and promotion
/// /properties/{id}/images                 multipart upload
/// /dashboard/properties                   agent dashboard
///
/// /subscription/tiers                     public
/// /subscription/gate|current              requires auth
/// /subscription/checkout                  agent
///
/// /sponsors                               public (cached)
/// /favorites, /favorites/{property_id}    requires auth
/// /messages, /messages/{counterpart_id}   requires auth
/// /notifications/...                      requires auth
/// /payment/methods                        public
/// /seo/properties/{id}, /seo/pages/...    public
///
/// /admin/...                              admin only
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/profile", profile::own_router())
        .nest("/profiles", profile::public_router())
        .nest("/agents", profile::agents_router())
        .nest("/properties", property::router())
        .nest("/dashboard", property::dashboard_router())
        .nest("/subscription", subscription::router())
        .nest("/sponsors", marketplace::sponsors_router())
        .nest("/favorites", marketplace::favorites_router())
        .nest("/messages", marketplace::messages_router())
        .nest("/notifications", marketplace::notifications_router())
        .nest("/payment", marketplace::payment_router())
        .nest("/seo", marketplace::seo_router())
        .nest("/admin", admin::router())
}
