//! Repository for the `agent_subscriptions` table.

use sqlx::PgPool;
use inmo_core::types::DbId;

use crate::models::subscription::{AgentSubscription, CreateSubscription};
use crate::models::tier::ActivePlanRow;

const COLUMNS: &str = "id, agent_id, tier_id, billing_period, amount_cents, is_active, \
                        current_period_start, current_period_end, deactivated_at, \
                        created_at, updated_at";

pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Activate a purchased plan, deactivating any previous one in the same
    /// transaction.
    ///
    /// Returns `None` if the agent profile does not exist.
    pub async fn activate(
        pool: &PgPool,
        input: &CreateSubscription,
    ) -> Result<Option<AgentSubscription>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM profiles WHERE id = $1 FOR UPDATE")
                .bind(input.agent_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        sqlx::query(
            "UPDATE agent_subscriptions SET is_active = false, deactivated_at = NOW()
             WHERE agent_id = $1 AND is_active = true",
        )
        .bind(input.agent_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO agent_subscriptions
                (agent_id, tier_id, billing_period, amount_cents, current_period_start, current_period_end)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let subscription = sqlx::query_as::<_, AgentSubscription>(&query)
            .bind(input.agent_id)
            .bind(input.tier_id)
            .bind(&input.billing_period)
            .bind(input.amount_cents)
            .bind(input.current_period_start)
            .bind(input.current_period_end)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(subscription))
    }

    /// The agent's active, unexpired subscription.
    pub async fn find_active(
        pool: &PgPool,
        agent_id: DbId,
    ) -> Result<Option<AgentSubscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM agent_subscriptions
             WHERE agent_id = $1 AND is_active = true AND current_period_end > NOW()"
        );
        sqlx::query_as::<_, AgentSubscription>(&query)
            .bind(agent_id)
            .fetch_optional(pool)
            .await
    }

    /// Tier behind the agent's active, unexpired subscription, if any.
    pub async fn find_active_plan(
        pool: &PgPool,
        agent_id: DbId,
    ) -> Result<Option<ActivePlanRow>, sqlx::Error> {
        sqlx::query_as::<_, ActivePlanRow>(
            "SELECT t.id AS tier_id, t.name AS tier_name, t.property_limit,
                    s.billing_period, s.current_period_start AS started_at
             FROM agent_subscriptions s
             JOIN subscription_tiers t ON t.id = s.tier_id
             WHERE s.agent_id = $1 AND s.is_active = true AND s.current_period_end > NOW()",
        )
        .bind(agent_id)
        .fetch_optional(pool)
        .await
    }
}
