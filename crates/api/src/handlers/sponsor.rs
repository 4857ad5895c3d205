//! Handlers for sponsors: the public strip and admin management.
//!
//! The public list is served from [`SponsorCache`](crate::cache::SponsorCache),
//! which follows the row changes published here.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use inmo_core::change_feed::{ChangeOp, RowChange, TABLE_SPONSORS};
use inmo_core::sponsor::{validate_display_order, validate_http_url, validate_sponsor_name};
use inmo_core::types::DbId;
use inmo_db::models::sponsor::{CreateSponsor, Sponsor, UpdateSponsor};
use inmo_db::repositories::SponsorRepo;

use crate::error::AppResult;
use crate::handlers::{not_found, read_file_field};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::storage::{sponsor_logo_path, validate_image};

fn publish(state: &AppState, op: ChangeOp, sponsor: &Sponsor) {
    state
        .event_bus
        .publish_change(RowChange::upsert(TABLE_SPONSORS, op, sponsor.id, sponsor));
}

/// GET /api/v1/sponsors
///
/// Active sponsors in display order.
pub async fn list_public(State(state): State<AppState>) -> Json<DataResponse<Vec<Sponsor>>> {
    Json(DataResponse {
        data: state.sponsor_cache.active().await,
    })
}

/// GET /api/v1/admin/sponsors
///
/// Every sponsor, inactive ones included, straight from the database.
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<Sponsor>>>> {
    let sponsors = SponsorRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: sponsors }))
}

/// POST /api/v1/admin/sponsors
pub async fn create_sponsor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateSponsor>,
) -> AppResult<(StatusCode, Json<DataResponse<Sponsor>>)> {
    validate_sponsor_name(&input.name)?;
    if let Some(url) = input.website_url.as_deref() {
        validate_http_url("website_url", url)?;
    }
    if let Some(url) = input.logo_url.as_deref() {
        validate_http_url("logo_url", url)?;
    }
    if let Some(order) = input.display_order {
        validate_display_order(order)?;
    }

    let sponsor = SponsorRepo::create(&state.pool, &input).await?;

    tracing::info!(sponsor_id = sponsor.id, created_by = admin.profile_id(), "Sponsor created");
    publish(&state, ChangeOp::Insert, &sponsor);
    Ok((StatusCode::CREATED, Json(DataResponse { data: sponsor })))
}

/// PUT /api/v1/admin/sponsors/{id}
pub async fn update_sponsor(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSponsor>,
) -> AppResult<Json<DataResponse<Sponsor>>> {
    if let Some(name) = input.name.as_deref() {
        validate_sponsor_name(name)?;
    }
    if let Some(url) = input.website_url.as_deref() {
        validate_http_url("website_url", url)?;
    }
    if let Some(order) = input.display_order {
        validate_display_order(order)?;
    }

    let sponsor = SponsorRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Sponsor", id))?;

    publish(&state, ChangeOp::Update, &sponsor);
    Ok(Json(DataResponse { data: sponsor }))
}

/// DELETE /api/v1/admin/sponsors/{id}
pub async fn delete_sponsor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !SponsorRepo::delete(&state.pool, id).await? {
        return Err(not_found("Sponsor", id));
    }
    tracing::info!(sponsor_id = id, deleted_by = admin.profile_id(), "Sponsor deleted");
    state
        .event_bus
        .publish_change(RowChange::delete(TABLE_SPONSORS, id));
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/sponsors/{id}/logo
///
/// Multipart upload with a single `file` field; replaces the logo URL.
pub async fn upload_logo(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<Sponsor>>> {
    SponsorRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("Sponsor", id))?;

    let file = read_file_field(multipart).await?;
    let ext = validate_image(&file.filename, file.data.len())?;
    let path = sponsor_logo_path(id, &ext);

    state.storage.upload(&path, &file.data).await?;
    let url = state.storage.public_url(&path);

    let Some(sponsor) = SponsorRepo::set_logo(&state.pool, id, &url).await? else {
        state.storage.delete(&path).await?;
        return Err(not_found("Sponsor", id));
    };

    tracing::info!(sponsor_id = id, path = %path, "Sponsor logo stored");
    publish(&state, ChangeOp::Update, &sponsor);
    Ok(Json(DataResponse { data: sponsor }))
}
