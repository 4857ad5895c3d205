//! Handlers for the `/auth` resource: signup, login, token refresh, logout,
//! the current session, and phone verification codes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use inmo_core::error::CoreError;
use inmo_core::otp::{self, StoredCode, OTP_MAX_ATTEMPTS, OTP_TTL_MINS};
use inmo_core::profile::normalize_phone;
use inmo_core::roles::{requires_approval, SIGNUP_USER_TYPES, USER_TYPE_CLIENT};
use inmo_core::session::{SessionEvent, SessionProfile, SessionState};
use inmo_core::types::{DbId, Timestamp};
use inmo_db::models::profile::Profile;
use inmo_db::models::session::CreateSession;
use inmo_db::models::user::NewAccount;
use inmo_db::repositories::{PhoneVerificationRepo, ProfileRepo, SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Session;
use crate::response::DataResponse;
use crate::state::AppState;

/// Consecutive failed logins before the account is locked.
const MAX_FAILED_ATTEMPTS: i32 = 5;

const LOCK_DURATION_MINS: i64 = 15;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "must be a valid e-mail address"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 2, max = 120, message = "must be between 2 and 120 characters"))]
    pub full_name: String,
    pub phone: Option<String>,
    /// `client` (default) or `agent`. Agents start as clients until approved.
    pub user_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Returned by signup, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub session: SessionState,
    /// Status of the agent registration request, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: SessionState,
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct OtpIssued {
    pub phone: String,
    pub expires_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct OtpVerifyRequest {
    pub code: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Create an identity and its profile, then sign in. Signing up as an agent
/// creates a client profile plus a pending registration for admin review.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    input.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let requested = input.user_type.as_deref().unwrap_or(USER_TYPE_CLIENT);
    if !SIGNUP_USER_TYPES.contains(&requested) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Cannot sign up as '{requested}'. Must be one of: {}",
            SIGNUP_USER_TYPES.join(", ")
        ))));
    }
    let needs_approval = requires_approval(requested);

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let account = UserRepo::register(
        &state.pool,
        &NewAccount {
            email: input.email.trim().to_lowercase(),
            password_hash,
            full_name: input.full_name.trim().to_string(),
            phone: normalize_phone("phone", input.phone)?,
            user_type: if needs_approval {
                USER_TYPE_CLIENT.to_string()
            } else {
                requested.to_string()
            },
            pending_user_type: needs_approval.then(|| requested.to_string()),
        },
    )
    .await?;

    tracing::info!(
        user_id = account.user.id,
        profile_id = account.profile.id,
        pending_approval = needs_approval,
        "Account created"
    );

    let profile = SessionProfile {
        profile_id: account.profile.id,
        user_id: account.user.id,
        email: account.user.email,
        user_type: account.profile.user_type,
        role: account.profile.role,
    };
    let session = SessionState::Unauthenticated
        .transition(SessionEvent::SignInStarted)?
        .transition(SessionEvent::SignInSucceeded(profile))?;

    let mut response = issue_tokens(&state, session).await?;
    response.registration_status = account.registration.map(|r| r.status);

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let signing_in = SessionState::Unauthenticated.transition(SessionEvent::SignInStarted)?;

    let profile = match authenticate(&state, &input).await {
        Ok(profile) => profile,
        Err(e) => {
            let after = signing_in.transition(SessionEvent::SignInFailed)?;
            tracing::debug!(email = %input.email, state = after.name(), "Sign-in failed");
            return Err(e);
        }
    };

    let session = signing_in.transition(SessionEvent::SignInSucceeded(profile))?;
    Ok(Json(issue_tokens(&state, session).await?))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for a new pair. The old token is revoked.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let stored = SessionRepo::redeem(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid, expired or already used refresh token".into(),
            ))
        })?;

    let row = ProfileRepo::find_session_row(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !row.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let session = SessionState::Unauthenticated
        .transition(SessionEvent::SignInStarted)?
        .transition(SessionEvent::SignInSucceeded(row.into()))?;

    Ok(Json(issue_tokens(&state, session).await?))
}

/// POST /api/v1/auth/logout
///
/// Revoke every refresh token of the caller. Returns 204.
pub async fn logout(State(state): State<AppState>, session: Session) -> AppResult<StatusCode> {
    let signing_out = session.state().transition(SessionEvent::SignOutStarted)?;

    let revoked = SessionRepo::close_all_for_user(&state.pool, session.profile().user_id).await?;

    let after = signing_out.transition(SessionEvent::SignOutCompleted)?;
    tracing::info!(
        profile_id = session.profile_id(),
        revoked,
        state = after.name(),
        "Signed out"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/session
///
/// The caller's session and full profile row, freshly loaded.
pub async fn current_session(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<SessionResponse>>> {
    let profile = ProfileRepo::find_by_id(&state.pool, session.profile_id())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Profile",
            id: session.profile_id(),
        }))?;

    Ok(Json(DataResponse {
        data: SessionResponse {
            session: session.state(),
            profile,
        },
    }))
}

/// POST /api/v1/auth/otp/request
///
/// Issue a six-digit code for `phone`. Delivery happens outside this
/// service; the issue is logged.
pub async fn request_otp(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<OtpRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OtpIssued>>)> {
    let phone = normalize_phone("phone", Some(input.phone))?
        .ok_or_else(|| AppError::Core(CoreError::Validation("phone is required".into())))?;

    let code = otp::generate_code();
    let expires_at = Utc::now() + chrono::Duration::minutes(OTP_TTL_MINS);
    PhoneVerificationRepo::create(
        &state.pool,
        session.profile().user_id,
        &phone,
        &otp::hash_code(&code),
        expires_at,
    )
    .await?;

    tracing::info!(profile_id = session.profile_id(), phone = %phone, "Verification code issued");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: OtpIssued { phone, expires_at },
        }),
    ))
}

/// POST /api/v1/auth/otp/verify
///
/// Check the latest code. A match marks the phone verified on the profile.
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<OtpVerifyRequest>,
) -> AppResult<Json<DataResponse<Profile>>> {
    let user_id = session.profile().user_id;

    let pending = PhoneVerificationRepo::find_latest(&state.pool, user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "No verification code has been requested".into(),
            ))
        })?;

    let stored = StoredCode {
        expires_at: pending.expires_at,
        attempts: pending.attempts,
        consumed: pending.consumed_at.is_some(),
    };
    let submitted = otp::ensure_usable(&stored, &input.code, Utc::now())?;

    let code_hash =
        PhoneVerificationRepo::claim_attempt(&state.pool, pending.id, OTP_MAX_ATTEMPTS)
            .await?
            .ok_or_else(|| AppError::Core(otp::attempts_exhausted()))?;
    if !otp::code_matches(&code_hash, submitted) {
        return Err(AppError::Core(CoreError::Validation(
            "Incorrect verification code".into(),
        )));
    }

    if !PhoneVerificationRepo::consume_and_verify(&state.pool, pending.id, user_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Verification code was already used".into(),
        )));
    }

    let profile = ProfileRepo::find_by_id(&state.pool, session.profile_id())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Profile",
            id: session.profile_id(),
        }))?;

    tracing::info!(profile_id = profile.id, "Phone verified");
    Ok(Json(DataResponse { data: profile }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check credentials with lockout accounting.
async fn authenticate(state: &AppState, input: &LoginRequest) -> AppResult<SessionProfile> {
    let invalid = || AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into()));

    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if user.locked_until.is_some_and(|until| until > Utc::now()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        )));
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if failures >= MAX_FAILED_ATTEMPTS {
            let until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, until).await?;
            tracing::warn!(user_id = user.id, failures, "Account locked after failed logins");
        }
        return Err(invalid());
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let row = ProfileRepo::find_session_row(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("User {} has no profile", user.id)))?;
    Ok(row.into())
}

/// Sign an access token, persist a refresh session and build the response.
async fn issue_tokens(state: &AppState, session: SessionState) -> AppResult<AuthResponse> {
    let (user_id, profile_id): (DbId, DbId) = match session.profile() {
        Some(p) => (p.user_id, p.profile_id),
        None => {
            return Err(AppError::InternalError(format!(
                "Cannot issue tokens for a {} session",
                session.name()
            )))
        }
    };

    let access_token = generate_access_token(user_id, profile_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    SessionRepo::open(
        &state.pool,
        &CreateSession {
            user_id,
            refresh_token_hash: refresh_hash,
            expires_at: Utc::now()
                + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days),
            user_agent: None,
            ip_address: None,
        },
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_ttl_secs(),
        session,
        registration_status: None,
    })
}
