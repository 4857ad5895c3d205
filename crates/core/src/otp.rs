//! One-time codes for phone verification.
//!
//! Codes are six digits, valid for [`OTP_TTL_MINS`] minutes and allow
//! [`OTP_MAX_ATTEMPTS`] wrong guesses. Only the SHA-256 digest of a code
//! is persisted.

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::types::Timestamp;

pub const OTP_LENGTH: usize = 6;
pub const OTP_TTL_MINS: i64 = 10;
pub const OTP_MAX_ATTEMPTS: i32 = 5;

/// Generate a random zero-padded six-digit code.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:0width$}", width = OTP_LENGTH)
}

pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// State of a stored verification, as needed to decide whether it can
/// still take a guess.
#[derive(Debug, Clone)]
pub struct StoredCode {
    pub expires_at: Timestamp,
    pub attempts: i32,
    pub consumed: bool,
}

/// Check that `stored` can take another guess and that `submitted` is well
/// formed. Returns the trimmed submission.
///
/// This is a fast pre-check on a row read earlier. The attempt itself must
/// still be claimed atomically in storage before the digest is compared.
pub fn ensure_usable<'s>(
    stored: &StoredCode,
    submitted: &'s str,
    now: Timestamp,
) -> Result<&'s str, CoreError> {
    if stored.consumed {
        return Err(CoreError::Conflict("Verification code was already used".into()));
    }
    if stored.expires_at <= now {
        return Err(CoreError::Validation("Verification code has expired".into()));
    }
    if stored.attempts >= OTP_MAX_ATTEMPTS {
        return Err(attempts_exhausted());
    }
    let submitted = submitted.trim();
    if submitted.len() != OTP_LENGTH || !submitted.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "Verification code must be {OTP_LENGTH} digits"
        )));
    }
    Ok(submitted)
}

/// Compare a submission with the stored digest.
pub fn code_matches(code_hash: &str, submitted: &str) -> bool {
    hash_code(submitted) == code_hash
}

/// Refusal once a code has no attempts left, or lost the race for the last one.
pub fn attempts_exhausted() -> CoreError {
    CoreError::Forbidden("Too many attempts. Request a new code.".into())
}
