//! Repository for the read-only `subscription_tiers` table.

use sqlx::PgPool;
use inmo_core::types::DbId;

use crate::models::tier::SubscriptionTier;

const COLUMNS: &str = "id, name, description, monthly_price_cents, annual_price_cents, \
                        property_limit, sort_order, payment_link_url, created_at, updated_at";

pub struct TierRepo;

impl TierRepo {
    /// All tiers in display order.
    pub async fn list(pool: &PgPool) -> Result<Vec<SubscriptionTier>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscription_tiers ORDER BY sort_order, id");
        sqlx::query_as::<_, SubscriptionTier>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SubscriptionTier>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscription_tiers WHERE id = $1");
        sqlx::query_as::<_, SubscriptionTier>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<SubscriptionTier>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM subscription_tiers WHERE LOWER(name) = LOWER($1)");
        sqlx::query_as::<_, SubscriptionTier>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }
}
