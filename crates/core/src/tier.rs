//! Subscription tier constants and helpers.
//!
//! Tiers are seeded by `20260301000004_create_subscription_tiers_table.sql`
//! and are read-only from the API. A `property_limit` of `None` means the
//! tier allows unlimited active listings.

use chrono::Months;

use crate::error::CoreError;
use crate::types::Timestamp;

pub const TIER_BRONCE: &str = "Bronce";
pub const TIER_PLATA: &str = "Plata";
pub const TIER_ORO: &str = "Oro";
pub const TIER_PLATINO: &str = "Platino";

pub const BILLING_MONTHLY: &str = "monthly";
pub const BILLING_ANNUAL: &str = "annual";

pub const VALID_BILLING_PERIODS: &[&str] = &[BILLING_MONTHLY, BILLING_ANNUAL];

/// Validate that `period` is `"monthly"` or `"annual"`.
pub fn validate_billing_period(period: &str) -> Result<(), CoreError> {
    if VALID_BILLING_PERIODS.contains(&period) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid billing period '{period}'. Must be one of: {}",
            VALID_BILLING_PERIODS.join(", ")
        )))
    }
}

/// Price in cents charged for one billing period.
pub fn price_for_period(
    monthly_price_cents: i64,
    annual_price_cents: i64,
    period: &str,
) -> Result<i64, CoreError> {
    validate_billing_period(period)?;
    Ok(if period == BILLING_ANNUAL {
        annual_price_cents
    } else {
        monthly_price_cents
    })
}

/// End of the paid period that starts at `start`.
pub fn period_end(start: Timestamp, period: &str) -> Result<Timestamp, CoreError> {
    validate_billing_period(period)?;
    let months = if period == BILLING_ANNUAL { 12 } else { 1 };
    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| CoreError::Internal("Billing period end overflowed".into()))
}

/// Listings still available under `limit` given `active` current listings.
///
/// Returns `None` for unlimited tiers.
pub fn remaining_slots(limit: Option<i32>, active: i64) -> Option<i64> {
    limit.map(|l| (i64::from(l) - active).max(0))
}

/// Format a cent amount as a decimal string (`150000` -> `"1500.00"`).
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
