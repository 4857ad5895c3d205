//! Pending agent registrations awaiting admin review.

use serde::Serialize;
use sqlx::FromRow;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `pending_registrations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingRegistration {
    pub id: DbId,
    pub profile_id: DbId,
    pub requested_user_type: String,
    pub status: String,
    pub reason: Option<String>,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Registration joined with the applicant, for the moderation queue.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RegistrationListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub registration: PendingRegistration,
    pub full_name: String,
    pub email: String,
    pub current_user_type: String,
}
