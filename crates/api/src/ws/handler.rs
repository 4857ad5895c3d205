use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use inmo_core::change_feed::validate_channel;
use inmo_core::error::CoreError;
use inmo_core::types::DbId;
use inmo_db::repositories::ProfileRepo;
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws::manager::{ServerMessage, WsManager};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Browsers cannot set headers on a WebSocket handshake, so the access
    /// token travels in the query string.
    pub token: Option<String>,
}

/// Frames clients send.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
}

/// `GET /api/v1/ws[?token=...]`
///
/// Anonymous connections may follow the public change feeds. A valid token
/// additionally routes that profile's notifications to the connection; an
/// invalid one is refused before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> AppResult<impl IntoResponse> {
    let profile_id = match params.token.as_deref() {
        Some(token) => Some(resolve_profile(&state, token).await?),
        None => None,
    };
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, profile_id)))
}

async fn resolve_profile(state: &AppState, token: &str) -> AppResult<DbId> {
    let unauthorized = || AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()));
    let claims = validate_token(token, &state.config.jwt).map_err(|_| unauthorized())?;
    let row = ProfileRepo::find_session_row(&state.pool, claims.sub)
        .await?
        .filter(|row| row.is_active && row.profile_id == claims.pid)
        .ok_or_else(unauthorized)?;
    Ok(row.profile_id)
}

async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, profile_id: Option<DbId>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, profile_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), profile_id).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                let reply = handle_client_text(&ws_manager, &conn_id, text.as_str()).await;
                ws_manager.send_to(&conn_id, reply).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Apply one subscribe/unsubscribe frame and build the acknowledgement.
async fn handle_client_text(ws_manager: &WsManager, conn_id: &str, text: &str) -> Message {
    let parsed: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return ServerMessage::Error {
                message: format!("Unrecognized message: {e}"),
            }
            .to_message()
        }
    };

    match parsed {
        ClientMessage::Subscribe { channel } => {
            if let Err(e) = validate_channel(&channel) {
                return ServerMessage::Error {
                    message: e.to_string(),
                }
                .to_message();
            }
            ws_manager.subscribe(conn_id, &channel).await;
            ServerMessage::Subscribed { channel: &channel }.to_message()
        }
        ClientMessage::Unsubscribe { channel } => {
            ws_manager.unsubscribe(conn_id, &channel).await;
            ServerMessage::Unsubscribed { channel: &channel }.to_message()
        }
    }
}
