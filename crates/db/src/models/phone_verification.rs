use sqlx::FromRow;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `phone_verifications` table. Only the code digest is kept.
#[derive(Debug, Clone, FromRow)]
pub struct PhoneVerification {
    pub id: DbId,
    pub user_id: DbId,
    pub phone: String,
    pub code_hash: String,
    pub expires_at: Timestamp,
    pub attempts: i32,
    pub consumed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
