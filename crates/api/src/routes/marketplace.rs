//! Route definitions for the smaller public and per-user resources:
//! sponsors, favorites, messages, notifications, payment methods and SEO.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{favorite, message, notification, payment, seo, sponsor};
use crate::state::AppState;

/// Routes mounted at `/sponsors`.
///
/// ```text
/// GET    /   -> list_public
/// ```
pub fn sponsors_router() -> Router<AppState> {
    Router::new().route("/", get(sponsor::list_public))
}

/// Routes mounted at `/favorites`.
///
/// ```text
/// GET    /                  -> list_favorites
/// POST   /{property_id}     -> add_favorite
/// DELETE /{property_id}     -> remove_favorite
/// ```
pub fn favorites_router() -> Router<AppState> {
    Router::new()
        .route("/", get(favorite::list_favorites))
        .route(
            "/{property_id}",
            post(favorite::add_favorite).delete(favorite::remove_favorite),
        )
}

/// Routes mounted at `/messages`.
///
/// ```text
/// GET    /                    -> list_conversations
/// POST   /                    -> send_message
/// GET    /{counterpart_id}    -> get_thread
/// ```
pub fn messages_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(message::list_conversations).post(message::send_message),
        )
        .route("/{counterpart_id}", get(message::get_thread))
}

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /               -> list_notifications
/// POST   /read-all       -> mark_all_read
/// GET    /unread-count   -> unread_count
/// POST   /{id}/read      -> mark_read
/// ```
pub fn notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(notification::list_notifications))
        .route("/read-all", post(notification::mark_all_read))
        .route("/unread-count", get(notification::unread_count))
        .route("/{id}/read", post(notification::mark_read))
}

/// Routes mounted at `/payment`.
///
/// ```text
/// GET    /methods   -> list_methods
/// ```
pub fn payment_router() -> Router<AppState> {
    Router::new().route("/methods", get(payment::list_methods))
}

/// Routes mounted at `/seo`.
///
/// ```text
/// GET    /properties/{id}   -> property_meta
/// GET    /pages             -> home_meta
/// GET    /pages/{*route}    -> route_meta
/// ```
pub fn seo_router() -> Router<AppState> {
    Router::new()
        .route("/properties/{id}", get(seo::property_meta))
        .route("/pages", get(seo::home_meta))
        .route("/pages/{*route}", get(seo::route_meta))
}
