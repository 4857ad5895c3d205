use serde::Serialize;
use sqlx::FromRow;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `favorites` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Favorite {
    pub id: DbId,
    pub profile_id: DbId,
    pub property_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
