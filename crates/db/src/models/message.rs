//! Direct messages between profiles.

use serde::Serialize;
use sqlx::FromRow;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub sender_id: DbId,
    pub recipient_id: DbId,
    pub property_id: Option<DbId>,
    pub body: String,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub sender_id: DbId,
    pub recipient_id: DbId,
    pub property_id: Option<DbId>,
    pub body: String,
}

/// Latest message and unread count for one counterpart.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConversationSummary {
    pub counterpart_id: DbId,
    pub counterpart_name: String,
    pub last_message: String,
    pub last_message_at: Timestamp,
    pub unread_count: i64,
}
