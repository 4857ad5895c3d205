//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`Session`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use inmo_core::types::DbId;
use inmo_db::models::notification::Notification;
use inmo_db::repositories::NotificationRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::not_found;
use crate::middleware::auth::Session;
use crate::query::{clamp_limit, clamp_offset, MAX_PAGE_SIZE};
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked: u64,
}

/// GET /api/v1/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<PageResponse<Notification>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_PAGE_SIZE);
    let offset = clamp_offset(params.offset);
    let unread_only = params.unread_only.unwrap_or(false);

    let notifications = NotificationRepo::list_for_profile(
        &state.pool,
        session.profile_id(),
        unread_only,
        limit,
        offset,
    )
    .await?;

    Ok(Json(PageResponse {
        data: notifications,
        limit,
        offset,
    }))
}

/// POST /api/v1/notifications/{id}/read
///
/// 204 on success, 404 if the notification belongs to someone else.
pub async fn mark_read(
    State(state): State<AppState>,
    session: Session,
    Path(notification_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let found =
        NotificationRepo::mark_read(&state.pool, notification_id, session.profile_id()).await?;
    if !found {
        return Err(not_found("Notification", notification_id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    let marked = NotificationRepo::mark_all_read(&state.pool, session.profile_id()).await?;
    Ok(Json(DataResponse {
        data: MarkedRead { marked },
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let count = NotificationRepo::unread_count(&state.pool, session.profile_id()).await?;
    Ok(Json(DataResponse {
        data: UnreadCount { count },
    }))
}
