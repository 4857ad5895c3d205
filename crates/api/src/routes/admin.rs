//! Route definitions for `/admin`. Every handler requires the admin role.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{admin, sponsor};
use crate::state::AppState;
use crate::routes::property::MULTIPART_OVERHEAD;
use crate::storage::MAX_IMAGE_BYTES;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /users                         -> list_users
/// PUT    /users/{id}                    -> update_user
/// GET    /properties                    -> list_properties
/// DELETE /properties/{id}               -> delete_property
/// GET    /registrations                 -> list_registrations
/// POST   /registrations/{id}/approve    -> approve_registration
/// POST   /registrations/{id}/reject     -> reject_registration
/// GET    /agents/{id}/tier              -> tier_history
/// POST   /agents/{id}/tier              -> assign_tier
/// DELETE /agents/{id}/tier              -> revoke_tier
/// GET    /sponsors                      -> sponsor::list_all
/// POST   /sponsors                      -> sponsor::create_sponsor
/// PUT    /sponsors/{id}                 -> sponsor::update_sponsor
/// DELETE /sponsors/{id}                 -> sponsor::delete_sponsor
/// POST   /sponsors/{id}/logo            -> sponsor::upload_logo (multipart)
/// GET    /stats                         -> stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user))
        .route("/properties", get(admin::list_properties))
        .route("/properties/{id}", delete(admin::delete_property))
        .route("/registrations", get(admin::list_registrations))
        .route(
            "/registrations/{id}/approve",
            post(admin::approve_registration),
        )
        .route(
            "/registrations/{id}/reject",
            post(admin::reject_registration),
        )
        .route(
            "/agents/{id}/tier",
            get(admin::tier_history)
                .post(admin::assign_tier)
                .delete(admin::revoke_tier),
        )
        .route(
            "/sponsors",
            get(sponsor::list_all).post(sponsor::create_sponsor),
        )
        .route(
            "/sponsors/{id}",
            put(sponsor::update_sponsor).delete(sponsor::delete_sponsor),
        )
        .route(
            "/sponsors/{id}/logo",
            post(sponsor::upload_logo)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD)),
        )
        .route("/stats", get(admin::stats))
}
