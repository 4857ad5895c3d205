//! Auth identity model and DTOs.

use sqlx::FromRow;
use inmo_core::types::{DbId, Timestamp};

use crate::models::profile::Profile;
use crate::models::registration::PendingRegistration;

/// Full row from the `users` table.
///
/// Contains the password hash -- never serialize this to API responses.
/// Public-facing data lives on [`crate::models::profile::Profile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new identity.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
}

/// Everything signup writes: identity, profile and (for agents) the
/// registration request that an admin must review.
#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    /// User type the profile starts with.
    pub user_type: String,
    /// User type awaiting approval, if any.
    pub pending_user_type: Option<String>,
}

#[derive(Debug)]
pub struct RegisteredAccount {
    pub user: User,
    pub profile: Profile,
    pub registration: Option<PendingRegistration>,
}
