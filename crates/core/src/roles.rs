//! Well-known role and user-type constants.
//!
//! These must match the CHECK constraints in
//! `20260301000002_create_profiles_table.sql`.

/// Administrative role: full access to `/admin/*`.
pub const ROLE_ADMIN: &str = "admin";
/// Default role for every signed-up profile.
pub const ROLE_USER: &str = "user";

pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_USER];

/// Browses and favorites listings.
pub const USER_TYPE_CLIENT: &str = "client";
/// Publishes listings, gated by subscription status.
pub const USER_TYPE_AGENT: &str = "agent";
/// Platform staff.
pub const USER_TYPE_ADMIN: &str = "admin";

pub const VALID_USER_TYPES: &[&str] = &[USER_TYPE_CLIENT, USER_TYPE_AGENT, USER_TYPE_ADMIN];

/// User types a visitor may request at signup. Admins are only ever
/// promoted by another admin.
pub const SIGNUP_USER_TYPES: &[&str] = &[USER_TYPE_CLIENT, USER_TYPE_AGENT];

/// Return `true` if `value` is a known role.
pub fn is_valid_role(value: &str) -> bool {
    VALID_ROLES.contains(&value)
}

/// Return `true` if `value` is a known user type.
pub fn is_valid_user_type(value: &str) -> bool {
    VALID_USER_TYPES.contains(&value)
}

/// Whether a signup for `user_type` must wait for admin approval.
pub fn requires_approval(user_type: &str) -> bool {
    user_type == USER_TYPE_AGENT
}
