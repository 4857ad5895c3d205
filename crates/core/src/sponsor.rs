//! Sponsor validation.

use url::Url;

use crate::error::CoreError;

pub const MAX_SPONSOR_NAME_LENGTH: usize = 120;

pub fn validate_sponsor_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Sponsor name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_SPONSOR_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Sponsor name exceeds maximum length of {MAX_SPONSOR_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate that `value` is an absolute `http`/`https` URL.
pub fn validate_http_url(field: &str, value: &str) -> Result<(), CoreError> {
    let parsed = Url::parse(value)
        .map_err(|e| CoreError::Validation(format!("{field} is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        scheme => Err(CoreError::Validation(format!(
            "{field} must use http or https, got '{scheme}'"
        ))),
    }
}

pub fn validate_display_order(order: i32) -> Result<(), CoreError> {
    if order < 0 {
        return Err(CoreError::Validation(
            "display_order must not be negative".into(),
        ));
    }
    Ok(())
}
