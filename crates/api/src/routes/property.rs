//! Route definitions for `/properties` and the agent dashboard.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::property;
use crate::state::AppState;
use crate::storage::MAX_IMAGE_BYTES;

/// Multipart framing on top of the image itself.
pub(crate) const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Routes mounted at `/properties`.
///
/// ```text
/// GET    /                 -> list_feed (public)
/// POST   /                 -> create_property (gated)
/// GET    /featured         -> list_featured (public)
/// GET    /search           -> search (public)
/// GET    /{id}             -> get_property
/// PUT    /{id}             -> update_property
/// DELETE /{id}             -> delete_property
/// GET    /{id}/contact     -> contact_links (public)
/// POST   /{id}/pause       -> pause_property
/// POST   /{id}/activate    -> activate_property
/// POST   /{id}/promote     -> toggle_promoted
/// POST   /{id}/images      -> upload_image (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(property::list_feed).post(property::create_property),
        )
        .route("/featured", get(property::list_featured))
        .route("/search", get(property::search))
        .route(
            "/{id}",
            get(property::get_property)
                .put(property::update_property)
                .delete(property::delete_property),
        )
        .route("/{id}/contact", get(property::contact_links))
        .route("/{id}/pause", post(property::pause_property))
        .route("/{id}/activate", post(property::activate_property))
        .route("/{id}/promote", post(property::toggle_promoted))
        .route(
            "/{id}/images",
            post(property::upload_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD)),
        )
}

/// Routes mounted at `/dashboard`.
///
/// ```text
/// GET    /properties   -> dashboard (agent)
/// ```
pub fn dashboard_router() -> Router<AppState> {
    Router::new().route("/properties", get(property::dashboard))
}
