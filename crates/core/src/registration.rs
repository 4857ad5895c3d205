//! Pending registration statuses and review rules.
//!
//! A signup that requests a user type needing approval (currently only
//! `agent`) is stored as `pending`. An admin either approves it, which
//! promotes the profile to the requested type, or rejects it, which leaves
//! the profile untouched.

use crate::error::CoreError;
use crate::roles::{is_valid_user_type, USER_TYPE_ADMIN};

pub const REGISTRATION_PENDING: &str = "pending";
pub const REGISTRATION_APPROVED: &str = "approved";
pub const REGISTRATION_REJECTED: &str = "rejected";

pub const VALID_REGISTRATION_STATUSES: &[&str] = &[
    REGISTRATION_PENDING,
    REGISTRATION_APPROVED,
    REGISTRATION_REJECTED,
];

/// Maximum length of a rejection reason.
pub const MAX_REJECTION_REASON_LENGTH: usize = 1_000;

/// An admin's verdict on a pending registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Review {
    Approve,
    Reject,
}

impl Review {
    /// Status the registration ends up in.
    pub fn target_status(self) -> &'static str {
        match self {
            Review::Approve => REGISTRATION_APPROVED,
            Review::Reject => REGISTRATION_REJECTED,
        }
    }

    /// Whether this verdict changes the profile's `user_type`.
    pub fn promotes_profile(self) -> bool {
        matches!(self, Review::Approve)
    }
}

pub fn validate_registration_status(status: &str) -> Result<(), CoreError> {
    if VALID_REGISTRATION_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid registration status '{status}'. Must be one of: {}",
            VALID_REGISTRATION_STATUSES.join(", ")
        )))
    }
}

/// Check that a registration currently in `status` can receive a review.
pub fn ensure_reviewable(status: &str) -> Result<(), CoreError> {
    if status == REGISTRATION_PENDING {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Registration has already been {status}"
        )))
    }
}

/// Validate the user type recorded on a registration request.
pub fn validate_requested_user_type(user_type: &str) -> Result<(), CoreError> {
    if !is_valid_user_type(user_type) || user_type == USER_TYPE_ADMIN {
        return Err(CoreError::Validation(format!(
            "Cannot request user type '{user_type}'"
        )));
    }
    Ok(())
}

/// Normalize an optional rejection reason (blank becomes `None`).
pub fn normalize_reason(reason: Option<String>) -> Result<Option<String>, CoreError> {
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if let Some(r) = &reason {
        if r.chars().count() > MAX_REJECTION_REASON_LENGTH {
            return Err(CoreError::Validation(format!(
                "Reason exceeds maximum length of {MAX_REJECTION_REASON_LENGTH} characters"
            )));
        }
    }
    Ok(reason)
}
