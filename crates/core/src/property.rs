//! Property listing constants, status rules, and search helpers.

use crate::error::CoreError;
use crate::sponsor::validate_http_url;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Listing is visible in public feeds.
pub const STATUS_ACTIVE: &str = "active";
/// Temporarily hidden by its agent or an admin.
pub const STATUS_PAUSED: &str = "paused";
pub const STATUS_SOLD: &str = "sold";
pub const STATUS_RENTED: &str = "rented";

pub const VALID_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_PAUSED, STATUS_SOLD, STATUS_RENTED];

pub const OPERATION_SALE: &str = "sale";
pub const OPERATION_RENT: &str = "rent";

pub const VALID_OPERATIONS: &[&str] = &[OPERATION_SALE, OPERATION_RENT];

pub const VALID_PROPERTY_TYPES: &[&str] = &[
    "house",
    "apartment",
    "land",
    "office",
    "commercial",
    "warehouse",
];

/// Image rendered when a listing has no photos.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Maximum photos attached to a single listing.
pub const MAX_IMAGES_PER_PROPERTY: usize = 20;

/// Maximum number of search terms honoured in one query.
const MAX_SEARCH_TERMS: usize = 8;

/* --------------------------------------------------------------------------
Validation
-------------------------------------------------------------------------- */

pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid property status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )))
    }
}

pub fn validate_operation(operation: &str) -> Result<(), CoreError> {
    if VALID_OPERATIONS.contains(&operation) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid operation '{operation}'. Must be one of: {}",
            VALID_OPERATIONS.join(", ")
        )))
    }
}

pub fn validate_property_type(property_type: &str) -> Result<(), CoreError> {
    if VALID_PROPERTY_TYPES.contains(&property_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid property type '{property_type}'. Must be one of: {}",
            VALID_PROPERTY_TYPES.join(", ")
        )))
    }
}

/// Check that a listing may move from `from` to `to`.
///
/// Paused and closed (sold/rented) listings can be re-activated; a listing
/// cannot be "moved" to the status it already has.
pub fn validate_status_transition(from: &str, to: &str) -> Result<(), CoreError> {
    validate_status(to)?;
    if from == to {
        return Err(CoreError::Conflict(format!("Property is already {to}")));
    }
    let allowed = match from {
        STATUS_ACTIVE => true,
        STATUS_PAUSED => true,
        STATUS_SOLD | STATUS_RENTED => to == STATUS_ACTIVE,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot change property status from {from} to {to}"
        )))
    }
}

/// Whether a listing in `status` appears in the public feeds.
pub fn is_publicly_visible(status: &str) -> bool {
    status == STATUS_ACTIVE
}

/* --------------------------------------------------------------------------
Images
-------------------------------------------------------------------------- */

/// The image shown on listing cards: the first non-blank URL, or the
/// placeholder when there is none.
pub fn cover_image(images: &[String]) -> &str {
    images
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER_IMAGE)
}

/// Ensure another image can be attached to a listing holding `current`.
pub fn ensure_image_capacity(current: usize) -> Result<(), CoreError> {
    if current >= MAX_IMAGES_PER_PROPERTY {
        return Err(CoreError::Validation(format!(
            "A property can have at most {MAX_IMAGES_PER_PROPERTY} images"
        )));
    }
    Ok(())
}

/// Check the gallery supplied with a new listing: at most
/// [`MAX_IMAGES_PER_PROPERTY`] entries, each an absolute http(s) URL.
pub fn validate_image_urls(images: &[String]) -> Result<(), CoreError> {
    if images.len() > MAX_IMAGES_PER_PROPERTY {
        return Err(CoreError::Validation(format!(
            "A property can have at most {MAX_IMAGES_PER_PROPERTY} images"
        )));
    }
    for (i, url) in images.iter().enumerate() {
        validate_http_url(&format!("images[{i}]"), url)?;
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Search
-------------------------------------------------------------------------- */

/// Split a free-text search box value into lowercase terms.
///
/// Terms shorter than two characters are dropped and duplicates removed.
pub fn search_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for raw in query.split(|c: char| c.is_whitespace() || c == ',') {
        let term = raw
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if term.chars().count() < 2 || terms.contains(&term) {
            continue;
        }
        terms.push(term);
        if terms.len() == MAX_SEARCH_TERMS {
            break;
        }
    }
    terms
}

/// Turn search terms into `ILIKE` patterns, escaping `%`, `_` and `\`.
pub fn like_patterns(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| {
            let escaped = t
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
        .collect()
}

/// Validate an optional price range.
pub fn validate_price_range(min: Option<i64>, max: Option<i64>) -> Result<(), CoreError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(CoreError::Validation(format!(
                "min_price ({min}) must not exceed max_price ({max})"
            )));
        }
    }
    if min.is_some_and(|v| v < 0) || max.is_some_and(|v| v < 0) {
        return Err(CoreError::Validation("Prices must not be negative".into()));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
