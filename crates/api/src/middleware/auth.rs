//! Session extractor for Axum handlers.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use inmo_core::error::CoreError;
use inmo_core::session::{SessionEvent, SessionProfile, SessionState};
use inmo_db::repositories::ProfileRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The signed-in profile behind a request's bearer token.
///
/// The token only proves identity. Role, user type and the active flag are
/// loaded from the database for every request, so an admin demoting a user
/// or approving an agent takes effect on that user's next call.
///
/// ```ignore
/// async fn my_handler(session: Session) -> AppResult<Json<()>> {
///     tracing::info!(profile_id = session.profile_id(), "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Session(pub SessionProfile);

impl Session {
    pub fn profile(&self) -> &SessionProfile {
        &self.0
    }

    pub fn profile_id(&self) -> inmo_core::types::DbId {
        self.0.profile_id
    }

    /// The session as a lifecycle value, for `GET /auth/session`.
    pub fn state(&self) -> SessionState {
        SessionState::Authenticated(self.0.clone())
    }
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        let row = ProfileRepo::find_session_row(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| unauthorized("Profile no longer exists"))?;

        if !row.is_active {
            return Err(unauthorized("Account is deactivated"));
        }
        if row.profile_id != claims.pid {
            return Err(unauthorized("Token does not match the current profile"));
        }

        let session = SessionState::Authenticating
            .transition(SessionEvent::SignInSucceeded(row.into()))?;
        match session {
            SessionState::Authenticated(profile) => Ok(Session(profile)),
            other => Err(AppError::InternalError(format!(
                "Session resolved to {} instead of authenticated",
                other.name()
            ))),
        }
    }
}

/// `Option<Session>`: anonymous when no `Authorization` header is sent, but a
/// header that is present must still be valid.
impl OptionalFromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key("authorization") {
            return Ok(None);
        }
        <Session as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}
