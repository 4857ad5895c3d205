//! Admin-only handlers: users, listings, agent registrations, tier
//! assignments and platform statistics.
//!
//! Every handler takes [`RequireAdmin`], so non-admins get 403 before any
//! work is done.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use inmo_core::error::CoreError;
use inmo_core::property::validate_status;
use inmo_core::registration::{
    ensure_reviewable, normalize_reason, validate_registration_status,
    validate_requested_user_type, Review,
};
use inmo_core::roles::{is_valid_role, is_valid_user_type, ROLE_ADMIN, USER_TYPE_AGENT};
use inmo_core::tier::{validate_billing_period, BILLING_MONTHLY};
use inmo_core::types::DbId;
use inmo_db::models::profile::{AdminUpdateUser, AdminUserRow, Profile};
use inmo_db::models::property::PropertyResponse;
use inmo_db::models::registration::{PendingRegistration, RegistrationListItem};
use inmo_db::models::stats::PlatformStats;
use inmo_db::models::tier_assignment::{AgentTierAssignment, AssignTier};
use inmo_db::repositories::{
    ProfileRepo, PropertyRepo, RegistrationRepo, StatsRepo, TierAssignmentRepo, TierRepo,
};
use inmo_events::{event_types, PlatformEvent};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::not_found;
use crate::handlers::property::remove_property;
use crate::middleware::auth::Session;
use crate::middleware::rbac::RequireAdmin;
use crate::query::{clamp_limit, clamp_offset, StatusFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub user_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

/// Either `tier_id` or `tier_name` selects the tier.
#[derive(Debug, Deserialize)]
pub struct AssignTierRequest {
    pub tier_id: Option<DbId>,
    pub tier_name: Option<String>,
    pub billing_period: Option<String>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<UserFilter>,
) -> AppResult<Json<PageResponse<AdminUserRow>>> {
    if let Some(t) = params.user_type.as_deref() {
        if !is_valid_user_type(t) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid user type '{t}'"
            ))));
        }
    }
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = clamp_offset(params.offset);

    let users =
        ProfileRepo::list_for_admin(&state.pool, params.user_type.as_deref(), limit, offset)
            .await?;
    Ok(Json(PageResponse {
        data: users,
        limit,
        offset,
    }))
}

/// PUT /api/v1/admin/users/{id}
///
/// Change role, user type or activation. Admins cannot demote or deactivate
/// themselves.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(profile_id): Path<DbId>,
    Json(input): Json<AdminUpdateUser>,
) -> AppResult<Json<DataResponse<Profile>>> {
    if let Some(role) = input.role.as_deref() {
        if !is_valid_role(role) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid role '{role}'"
            ))));
        }
    }
    if let Some(t) = input.user_type.as_deref() {
        if !is_valid_user_type(t) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid user type '{t}'"
            ))));
        }
    }
    if profile_id == admin.profile_id() {
        let demotes = input.role.as_deref().is_some_and(|r| r != ROLE_ADMIN);
        let deactivates = input.is_active == Some(false);
        if demotes || deactivates {
            return Err(AppError::Core(CoreError::Conflict(
                "Admins cannot demote or deactivate their own account".into(),
            )));
        }
    }

    let profile = ProfileRepo::admin_update(&state.pool, profile_id, &input)
        .await?
        .ok_or_else(|| not_found("Profile", profile_id))?;

    tracing::info!(
        profile_id,
        admin_id = admin.profile_id(),
        role = ?input.role,
        user_type = ?input.user_type,
        is_active = ?input.is_active,
        "User updated by admin"
    );
    Ok(Json(DataResponse { data: profile }))
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/properties?status=
pub async fn list_properties(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<StatusFilter>,
) -> AppResult<Json<PageResponse<PropertyResponse>>> {
    if let Some(status) = params.status.as_deref() {
        validate_status(status)?;
    }
    let (limit, offset) = params.window();
    let rows = PropertyRepo::list_all(&state.pool, params.status.as_deref(), limit, offset).await?;
    Ok(Json(PageResponse {
        data: rows.into_iter().map(PropertyResponse::from).collect(),
        limit,
        offset,
    }))
}

/// DELETE /api/v1/admin/properties/{id}
pub async fn delete_property(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    remove_property(&state, admin.profile(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Registrations
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/registrations?status=
pub async fn list_registrations(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<StatusFilter>,
) -> AppResult<Json<PageResponse<RegistrationListItem>>> {
    if let Some(status) = params.status.as_deref() {
        validate_registration_status(status)?;
    }
    let (limit, offset) = params.window();
    let rows =
        RegistrationRepo::list(&state.pool, params.status.as_deref(), limit, offset).await?;
    Ok(Json(PageResponse {
        data: rows,
        limit,
        offset,
    }))
}

/// POST /api/v1/admin/registrations/{id}/approve
///
/// Promotes the profile to the requested user type.
pub async fn approve_registration(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PendingRegistration>>> {
    let registration = review(&state, &admin, id, Review::Approve, None).await?;
    Ok(Json(DataResponse { data: registration }))
}

/// POST /api/v1/admin/registrations/{id}/reject
///
/// The profile keeps its current user type.
pub async fn reject_registration(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    input: Option<Json<RejectRequest>>,
) -> AppResult<Json<DataResponse<PendingRegistration>>> {
    let reason = normalize_reason(input.and_then(|Json(body)| body.reason))?;
    let registration = review(&state, &admin, id, Review::Reject, reason).await?;
    Ok(Json(DataResponse { data: registration }))
}

async fn review(
    state: &AppState,
    admin: &Session,
    id: DbId,
    verdict: Review,
    reason: Option<String>,
) -> AppResult<PendingRegistration> {
    let current = RegistrationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Registration", id))?;
    ensure_reviewable(&current.status)?;
    if verdict.promotes_profile() {
        validate_requested_user_type(&current.requested_user_type)?;
    }

    let reviewed = match verdict {
        Review::Approve => RegistrationRepo::approve(&state.pool, id, admin.profile_id()).await?,
        Review::Reject => {
            RegistrationRepo::reject(&state.pool, id, admin.profile_id(), reason.as_deref())
                .await?
        }
    };
    // Another admin reviewed it between the read and the update.
    let registration = reviewed.ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Registration has already been reviewed".into(),
        ))
    })?;

    tracing::info!(
        registration_id = id,
        profile_id = registration.profile_id,
        admin_id = admin.profile_id(),
        status = verdict.target_status(),
        "Registration reviewed"
    );

    let (event_type, payload) = match verdict {
        Review::Approve => (
            event_types::REGISTRATION_APPROVED,
            serde_json::json!({ "user_type": registration.requested_user_type }),
        ),
        Review::Reject => (
            event_types::REGISTRATION_REJECTED,
            serde_json::json!({ "reason": registration.reason }),
        ),
    };
    state.event_bus.publish(
        PlatformEvent::new(event_type)
            .with_source("pending_registration", registration.id)
            .with_actor(admin.profile_id())
            .with_target(registration.profile_id)
            .with_payload(payload),
    );

    Ok(registration)
}

// ---------------------------------------------------------------------------
// Tier assignments
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/agents/{id}/tier
///
/// Replace the agent's active assignment in one transaction.
pub async fn assign_tier(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(agent_id): Path<DbId>,
    Json(input): Json<AssignTierRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AgentTierAssignment>>)> {
    let billing_period = input
        .billing_period
        .unwrap_or_else(|| BILLING_MONTHLY.to_string());
    validate_billing_period(&billing_period)?;

    let tier = match (input.tier_id, input.tier_name.as_deref()) {
        (Some(tier_id), _) => TierRepo::find_by_id(&state.pool, tier_id)
            .await?
            .ok_or_else(|| not_found("SubscriptionTier", tier_id))?,
        (None, Some(name)) => TierRepo::find_by_name(&state.pool, name)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Validation(format!("Unknown tier '{name}'")))
            })?,
        (None, None) => {
            return Err(AppError::Core(CoreError::Validation(
                "tier_id or tier_name is required".into(),
            )))
        }
    };

    let agent = ProfileRepo::find_by_id(&state.pool, agent_id)
        .await?
        .ok_or_else(|| not_found("Profile", agent_id))?;
    if agent.user_type != USER_TYPE_AGENT {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Profile {agent_id} is not an agent"
        ))));
    }

    let assignment = TierAssignmentRepo::assign(
        &state.pool,
        &AssignTier {
            agent_id,
            tier_id: tier.id,
            billing_period,
            assigned_by: Some(admin.profile_id()),
        },
    )
    .await?
    .ok_or_else(|| not_found("Profile", agent_id))?;

    tracing::info!(
        agent_id,
        tier = %tier.name,
        admin_id = admin.profile_id(),
        "Tier assigned"
    );
    state.event_bus.publish(
        PlatformEvent::new(event_types::TIER_ASSIGNED)
            .with_source("agent_tier_assignment", assignment.id)
            .with_actor(admin.profile_id())
            .with_target(agent_id)
            .with_payload(serde_json::json!({ "tier_name": tier.name })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: assignment })))
}

/// DELETE /api/v1/admin/agents/{id}/tier
pub async fn revoke_tier(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(agent_id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !TierAssignmentRepo::deactivate(&state.pool, agent_id).await? {
        return Err(not_found("AgentTierAssignment", agent_id));
    }

    tracing::info!(agent_id, admin_id = admin.profile_id(), "Tier assignment revoked");
    state.event_bus.publish(
        PlatformEvent::new(event_types::TIER_REVOKED)
            .with_actor(admin.profile_id())
            .with_target(agent_id),
    );
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/agents/{id}/tier
///
/// Assignment history, newest first.
pub async fn tier_history(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(agent_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<AgentTierAssignment>>>> {
    let rows = TierAssignmentRepo::list_for_agent(&state.pool, agent_id).await?;
    Ok(Json(DataResponse { data: rows }))
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<PlatformStats>>> {
    let stats = StatsRepo::platform(&state.pool).await?;
    Ok(Json(DataResponse { data: stats }))
}
