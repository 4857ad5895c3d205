//! Aggregate counts for the admin dashboard.

use sqlx::PgPool;

use crate::models::stats::PlatformStats;

pub struct StatsRepo;

impl StatsRepo {
    pub async fn platform(pool: &PgPool) -> Result<PlatformStats, sqlx::Error> {
        sqlx::query_as::<_, PlatformStats>(
            "SELECT
                (SELECT COUNT(*) FROM profiles WHERE user_type = 'client') AS clients,
                (SELECT COUNT(*) FROM profiles WHERE user_type = 'agent') AS agents,
                (SELECT COUNT(*) FROM profiles WHERE user_type = 'admin') AS admins,
                (SELECT COUNT(*) FROM properties WHERE status = 'active') AS active_properties,
                (SELECT COUNT(*) FROM properties WHERE status = 'paused') AS paused_properties,
                (SELECT COUNT(*) FROM properties WHERE status = 'sold') AS sold_properties,
                (SELECT COUNT(*) FROM properties WHERE status = 'rented') AS rented_properties,
                (SELECT COUNT(*) FROM pending_registrations WHERE status = 'pending')
                    AS pending_registrations,
                (SELECT COUNT(*) FROM sponsors WHERE is_active) AS active_sponsors",
        )
        .fetch_one(pool)
        .await
    }
}
