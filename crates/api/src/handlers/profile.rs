//! Handlers for profiles: the caller's own profile, public profile views and
//! agent portfolios.

use axum::extract::{Path, State};
use axum::Json;
use inmo_core::profile::{apply_privacy, normalize_phone, validate_bio, ContactFields, PrivacyFlags};
use inmo_core::roles::USER_TYPE_AGENT;
use inmo_core::types::{DbId, Timestamp};
use inmo_db::models::profile::{Profile, ProfileWithEmail, UpdateProfile};
use inmo_db::models::property::PropertyResponse;
use inmo_db::repositories::{ProfileRepo, PropertyRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::not_found;
use crate::middleware::auth::Session;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 120, message = "must be between 2 and 120 characters"))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    #[validate(length(max = 120, message = "must be at most 120 characters"))]
    pub company: Option<String>,
    pub bio: Option<String>,
    #[validate(url(message = "must be a valid URL"))]
    pub avatar_url: Option<String>,
    pub show_email: Option<bool>,
    pub show_phone: Option<bool>,
}

/// What anyone may see about a profile. Hidden contact fields are `null`.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: DbId,
    pub full_name: String,
    pub user_type: String,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub phone_verified: bool,
    pub created_at: Timestamp,
}

impl From<ProfileWithEmail> for PublicProfile {
    fn from(row: ProfileWithEmail) -> Self {
        let p = row.profile;
        let contact = apply_privacy(
            ContactFields {
                email: Some(row.email),
                phone: p.phone,
                whatsapp: p.whatsapp,
            },
            PrivacyFlags {
                show_email: p.show_email,
                show_phone: p.show_phone,
            },
        );
        PublicProfile {
            id: p.id,
            full_name: p.full_name,
            user_type: p.user_type,
            company: p.company,
            bio: p.bio,
            avatar_url: p.avatar_url,
            email: contact.email,
            phone: contact.phone,
            whatsapp: contact.whatsapp,
            phone_verified: p.phone_verified,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Portfolio {
    pub agent: PublicProfile,
    pub properties: Vec<PropertyResponse>,
}

/// GET /api/v1/profile
pub async fn get_own(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<Profile>>> {
    let profile = ProfileRepo::find_by_id(&state.pool, session.profile_id())
        .await?
        .ok_or_else(|| not_found("Profile", session.profile_id()))?;
    Ok(Json(DataResponse { data: profile }))
}

/// PUT /api/v1/profile
///
/// Changing the phone number clears its verified flag.
pub async fn update_own(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<Profile>>> {
    input.validate()?;
    validate_bio(input.bio.as_deref())?;

    let changes = UpdateProfile {
        full_name: input.full_name.map(|n| n.trim().to_string()),
        phone: normalize_phone("phone", input.phone)?,
        whatsapp: normalize_phone("whatsapp", input.whatsapp)?,
        company: input.company,
        bio: input.bio,
        avatar_url: input.avatar_url,
        show_email: input.show_email,
        show_phone: input.show_phone,
    };

    let profile = ProfileRepo::update(&state.pool, session.profile_id(), &changes)
        .await?
        .ok_or_else(|| not_found("Profile", session.profile_id()))?;

    tracing::info!(profile_id = profile.id, "Profile updated");
    Ok(Json(DataResponse { data: profile }))
}

/// GET /api/v1/profiles/{id}
pub async fn get_public(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PublicProfile>>> {
    let row = ProfileRepo::find_with_email(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Profile", id))?;
    Ok(Json(DataResponse { data: row.into() }))
}

/// GET /api/v1/agents/{id}/portfolio
///
/// An agent's public profile with their active listings.
pub async fn portfolio(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Portfolio>>> {
    let row = ProfileRepo::find_with_email(&state.pool, id)
        .await?
        .filter(|row| row.profile.user_type == USER_TYPE_AGENT)
        .ok_or_else(|| not_found("Agent", id))?;

    let properties = PropertyRepo::list_active_by_agent(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: Portfolio {
            agent: row.into(),
            properties: properties.into_iter().map(PropertyResponse::from).collect(),
        },
    }))
}
