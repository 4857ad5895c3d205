//! Admin-assigned agent plans.

use serde::Serialize;
use sqlx::FromRow;
use inmo_core::types::{DbId, Timestamp};

/// A row from the `agent_tier_assignments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgentTierAssignment {
    pub id: DbId,
    pub agent_id: DbId,
    pub tier_id: DbId,
    pub billing_period: String,
    pub is_active: bool,
    pub assigned_by: Option<DbId>,
    pub deactivated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct AssignTier {
    pub agent_id: DbId,
    pub tier_id: DbId,
    pub billing_period: String,
    pub assigned_by: Option<DbId>,
}
