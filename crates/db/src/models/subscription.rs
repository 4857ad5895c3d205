//! Purchased agent plans.

use serde::Serialize;
use sqlx::FromRow;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `agent_subscriptions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgentSubscription {
    pub id: DbId,
    pub agent_id: DbId,
    pub tier_id: DbId,
    pub billing_period: String,
    pub amount_cents: i64,
    pub is_active: bool,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    pub deactivated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub agent_id: DbId,
    pub tier_id: DbId,
    pub billing_period: String,
    pub amount_cents: i64,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
}
