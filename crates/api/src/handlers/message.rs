//! Direct messages between profiles.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use inmo_core::error::CoreError;
use inmo_core::seo::truncate_words;
use inmo_core::types::DbId;
use inmo_db::models::message::{ConversationSummary, CreateMessage, Message};
use inmo_db::repositories::{MessageRepo, ProfileRepo, PropertyRepo};
use inmo_events::{event_types, PlatformEvent};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::not_found;
use crate::middleware::auth::Session;
use crate::query::PaginationParams;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

/// Characters of the body quoted in the recipient's notification.
const PREVIEW_LENGTH: usize = 80;

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub recipient_id: DbId,
    pub property_id: Option<DbId>,
    #[validate(length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"))]
    pub body: String,
}

/// POST /api/v1/messages
pub async fn send_message(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Message>>)> {
    input.validate()?;
    let body = input.body.trim().to_string();
    if body.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "body: must not be blank".into(),
        )));
    }
    if input.recipient_id == session.profile_id() {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot send a message to yourself".into(),
        )));
    }

    let sender = ProfileRepo::find_by_id(&state.pool, session.profile_id())
        .await?
        .ok_or_else(|| not_found("Profile", session.profile_id()))?;
    ProfileRepo::find_by_id(&state.pool, input.recipient_id)
        .await?
        .ok_or_else(|| not_found("Profile", input.recipient_id))?;
    if let Some(property_id) = input.property_id {
        PropertyRepo::find_by_id(&state.pool, property_id)
            .await?
            .ok_or_else(|| not_found("Property", property_id))?;
    }

    let message = MessageRepo::create(
        &state.pool,
        &CreateMessage {
            sender_id: session.profile_id(),
            recipient_id: input.recipient_id,
            property_id: input.property_id,
            body,
        },
    )
    .await?;

    tracing::info!(
        message_id = message.id,
        sender_id = message.sender_id,
        recipient_id = message.recipient_id,
        "Message sent"
    );

    state.event_bus.publish(
        PlatformEvent::new(event_types::MESSAGE_RECEIVED)
            .with_source("message", message.id)
            .with_actor(message.sender_id)
            .with_target(message.recipient_id)
            .with_payload(serde_json::json!({
                "sender_name": sender.full_name,
                "preview": truncate_words(&message.body, PREVIEW_LENGTH),
            })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}

/// GET /api/v1/messages
///
/// One summary per counterpart, most recent conversation first.
pub async fn list_conversations(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<DataResponse<Vec<ConversationSummary>>>> {
    let conversations = MessageRepo::list_conversations(&state.pool, session.profile_id()).await?;
    Ok(Json(DataResponse {
        data: conversations,
    }))
}

/// GET /api/v1/messages/{counterpart_id}
///
/// The thread with one counterpart, oldest first. Incoming messages are
/// marked read.
pub async fn get_thread(
    State(state): State<AppState>,
    session: Session,
    Path(counterpart_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PageResponse<Message>>> {
    let (limit, offset) = params.window();
    let messages = MessageRepo::thread(
        &state.pool,
        session.profile_id(),
        counterpart_id,
        limit,
        offset,
    )
    .await?;

    let marked =
        MessageRepo::mark_thread_read(&state.pool, session.profile_id(), counterpart_id).await?;
    if marked > 0 {
        tracing::debug!(profile_id = session.profile_id(), counterpart_id, marked, "Thread read");
    }

    Ok(Json(PageResponse {
        data: messages,
        limit,
        offset,
    }))
}
