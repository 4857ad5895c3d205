//! In-app notification model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub profile_id: DbId,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub profile_id: DbId,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub link: Option<String>,
}
