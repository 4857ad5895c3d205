//! Handlers for the caller's saved listings.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use inmo_core::property::is_publicly_visible;
use inmo_core::types::DbId;
use inmo_db::models::property::PropertyResponse;
use inmo_db::repositories::{FavoriteRepo, PropertyRepo};

use crate::error::AppResult;
use crate::handlers::not_found;
use crate::middleware::auth::Session;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<Vec<PropertyResponse>>>> {
    let rows = FavoriteRepo::list_properties(&state.pool, session.profile_id()).await?;
    Ok(Json(DataResponse {
        data: rows.into_iter().map(PropertyResponse::from).collect(),
    }))
}

/// POST /api/v1/favorites/{property_id}
///
/// Idempotent: 201 when newly saved, 200 when it already was.
pub async fn add_favorite(
    State(state): State<AppState>,
    session: Session,
    Path(property_id): Path<DbId>,
) -> AppResult<StatusCode> {
    PropertyRepo::find_by_id(&state.pool, property_id)
        .await?
        .filter(|p| is_publicly_visible(&p.status))
        .ok_or_else(|| not_found("Property", property_id))?;

    let inserted = FavoriteRepo::add(&state.pool, session.profile_id(), property_id).await?;
    Ok(if inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    })
}

/// DELETE /api/v1/favorites/{property_id}
pub async fn remove_favorite(
    State(state): State<AppState>,
    session: Session,
    Path(property_id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !FavoriteRepo::remove(&state.pool, session.profile_id(), property_id).await? {
        return Err(not_found("Favorite", property_id));
    }
    Ok(StatusCode::NO_CONTENT)
}
