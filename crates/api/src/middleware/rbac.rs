//! Role and user-type guards.
//!
//! Each extractor wraps [`Session`] and rejects with 403 when the profile
//! does not qualify.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use inmo_core::error::CoreError;

use super::auth::Session;
use crate::error::AppError;
use crate::state::AppState;

/// Requires `role = 'admin'`.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(session): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub Session);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        if !session.profile().is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(session))
    }
}

/// Requires an agent profile. Admins also pass.
pub struct RequireAgent(pub Session);

impl FromRequestParts<AppState> for RequireAgent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let profile = session.profile();
        if !profile.is_agent() && !profile.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Agent account required".into(),
            )));
        }
        Ok(RequireAgent(session))
    }
}
