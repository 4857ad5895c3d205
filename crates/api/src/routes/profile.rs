//! Route definitions for profiles and agent portfolios.

use axum::routing::get;
use axum::Router;

use crate::handlers::profile;
use crate::state::AppState;

/// Routes mounted at `/profile` (the caller's own profile).
///
/// ```text
/// GET    /   -> get_own
/// PUT    /   -> update_own
/// ```
pub fn own_router() -> Router<AppState> {
    Router::new().route("/", get(profile::get_own).put(profile::update_own))
}

/// Routes mounted at `/profiles`.
///
/// ```text
/// GET    /{id}   -> get_public
/// ```
pub fn public_router() -> Router<AppState> {
    Router::new().route("/{id}", get(profile::get_public))
}

/// Routes mounted at `/agents`.
///
/// ```text
/// GET    /{id}/portfolio   -> portfolio
/// ```
pub fn agents_router() -> Router<AppState> {
    Router::new().route("/{id}/portfolio", get(profile::portfolio))
}
