use serde::Serialize;
use sqlx::FromRow;
use inmo_core::subscription_gate::{ActivePlan, PlanSource};
use inmo_core::types::{DbId, Timestamp};

/// A row from the `subscription_tiers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriptionTier {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub monthly_price_cents: i64,
    pub annual_price_cents: i64,
    /// `None` means unlimited.
    pub property_limit: Option<i32>,
    pub sort_order: i32,
    pub payment_link_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The tier behind an agent's active assignment or subscription.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivePlanRow {
    pub tier_id: DbId,
    pub tier_name: String,
    pub property_limit: Option<i32>,
    pub billing_period: String,
    pub started_at: Timestamp,
}

impl ActivePlanRow {
    pub fn into_plan(self, source: PlanSource) -> ActivePlan {
        ActivePlan {
            tier_id: self.tier_id,
            tier_name: self.tier_name,
            property_limit: self.property_limit,
            source,
        }
    }
}
