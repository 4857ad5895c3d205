//! Route definitions for `/subscription`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::subscription;
use crate::state::AppState;

/// Routes mounted at `/subscription`.
///
/// ```text
/// GET    /tiers      -> list_tiers (public)
/// GET    /gate       -> gate
/// POST   /checkout   -> checkout (agent)
/// GET    /current    -> current
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tiers", get(subscription::list_tiers))
        .route("/gate", get(subscription::gate))
        .route("/checkout", post(subscription::checkout))
        .route("/current", get(subscription::current))
}
