//! Repository for the `agent_tier_assignments` table.
//!
//! An agent has at most one active assignment. Reassignment locks the
//! agent's profile row, deactivates the current assignment and inserts the
//! new one in a single transaction, so concurrent reassignments serialize.
//! The partial unique index `uq_agent_tier_assignments_one_active` backs
//! the invariant at the storage level.

use sqlx::PgPool;
use inmo_core::types::DbId;

use crate::models::tier::ActivePlanRow;
use crate::models::tier_assignment::{AgentTierAssignment, AssignTier};

const COLUMNS: &str = "id, agent_id, tier_id, billing_period, is_active, assigned_by, \
                        deactivated_at, created_at, updated_at";

pub struct TierAssignmentRepo;

impl TierAssignmentRepo {
    /// Replace the agent's active assignment with a new one.
    ///
    /// Returns `None` if the agent profile does not exist.
    pub async fn assign(
        pool: &PgPool,
        input: &AssignTier,
    ) -> Result<Option<AgentTierAssignment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Serialize concurrent reassignments for the same agent.
        let locked: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM profiles WHERE id = $1 FOR UPDATE")
                .bind(input.agent_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE agent_tier_assignments SET is_active = false, deactivated_at = NOW()
             WHERE agent_id = $1 AND is_active = true",
        )
        .bind(input.agent_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO agent_tier_assignments (agent_id, tier_id, billing_period, assigned_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let assignment = sqlx::query_as::<_, AgentTierAssignment>(&query)
            .bind(input.agent_id)
            .bind(input.tier_id)
            .bind(&input.billing_period)
            .bind(input.assigned_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(assignment))
    }

    /// Deactivate the agent's active assignment. Returns `true` if one existed.
    pub async fn deactivate(pool: &PgPool, agent_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE agent_tier_assignments SET is_active = false, deactivated_at = NOW()
             WHERE agent_id = $1 AND is_active = true",
        )
        .bind(agent_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_active(
        pool: &PgPool,
        agent_id: DbId,
    ) -> Result<Option<AgentTierAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM agent_tier_assignments
             WHERE agent_id = $1 AND is_active = true"
        );
        sqlx::query_as::<_, AgentTierAssignment>(&query)
            .bind(agent_id)
            .fetch_optional(pool)
            .await
    }

    /// Tier behind the agent's active assignment, if any.
    pub async fn find_active_plan(
        pool: &PgPool,
        agent_id: DbId,
    ) -> Result<Option<ActivePlanRow>, sqlx::Error> {
        sqlx::query_as::<_, ActivePlanRow>(
            "SELECT t.id AS tier_id, t.name AS tier_name, t.property_limit,
                    a.billing_period, a.created_at AS started_at
             FROM agent_tier_assignments a
             JOIN subscription_tiers t ON t.id = a.tier_id
             WHERE a.agent_id = $1 AND a.is_active = true",
        )
        .bind(agent_id)
        .fetch_optional(pool)
        .await
    }

    /// Full assignment history for an agent, newest first.
    pub async fn list_for_agent(
        pool: &PgPool,
        agent_id: DbId,
    ) -> Result<Vec<AgentTierAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM agent_tier_assignments
             WHERE agent_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, AgentTierAssignment>(&query)
            .bind(agent_id)
            .fetch_all(pool)
            .await
    }
}
