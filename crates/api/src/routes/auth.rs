//! Route definitions for `/auth`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /signup        -> signup (public)
/// POST   /login         -> login (public)
/// POST   /refresh       -> refresh (public)
/// POST   /logout        -> logout
/// GET    /session       -> current_session
/// POST   /otp/request   -> request_otp
/// POST   /otp/verify    -> verify_otp
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::current_session))
        .route("/otp/request", post(auth::request_otp))
        .route("/otp/verify", post(auth::verify_otp))
}
