//! Profile model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use inmo_core::session::SessionProfile;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: DbId,
    pub user_id: DbId,
    pub user_type: String,
    pub role: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub show_email: bool,
    pub show_phone: bool,
    pub phone_verified: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Profile joined with its identity, as loaded for every authenticated
/// request.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub profile_id: DbId,
    pub user_id: DbId,
    pub email: String,
    pub user_type: String,
    pub role: String,
    pub is_active: bool,
}

impl From<SessionRow> for SessionProfile {
    fn from(row: SessionRow) -> Self {
        SessionProfile {
            profile_id: row.profile_id,
            user_id: row.user_id,
            email: row.email,
            user_type: row.user_type,
            role: row.role,
        }
    }
}

/// Profile with the owner's e-mail, before privacy masking.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileWithEmail {
    #[sqlx(flatten)]
    pub profile: Profile,
    pub email: String,
}

/// Row of the admin user listing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminUserRow {
    pub profile_id: DbId,
    pub user_id: DbId,
    pub email: String,
    pub full_name: String,
    pub user_type: String,
    pub role: String,
    pub is_active: bool,
    /// Name of the active tier, whether assigned or purchased.
    pub active_tier: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateProfile {
    pub user_id: DbId,
    pub user_type: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Self-service profile edit. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub show_email: Option<bool>,
    pub show_phone: Option<bool>,
}

/// Admin edit of a user's permissions.
#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateUser {
    pub role: Option<String>,
    pub user_type: Option<String>,
    pub is_active: Option<bool>,
}
