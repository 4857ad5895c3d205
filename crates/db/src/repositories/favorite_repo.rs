//! Repository for the `favorites` table.

use sqlx::PgPool;
use inmo_core::types::DbId;

use crate::models::property::Property;

pub struct FavoriteRepo;

impl FavoriteRepo {
    /// Save a listing. Adding an existing favorite is a no-op.
    ///
    /// Returns `true` if a new row was inserted.
    pub async fn add(pool: &PgPool, profile_id: DbId, property_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO favorites (profile_id, property_id)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_favorites_profile_property DO NOTHING",
        )
        .bind(profile_id)
        .bind(property_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove(
        pool: &PgPool,
        profile_id: DbId,
        property_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM favorites WHERE profile_id = $1 AND property_id = $2")
            .bind(profile_id)
            .bind(property_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Saved listings, most recently saved first. Includes listings that
    /// have since been paused so the owner can still remove them.
    pub async fn list_properties(
        pool: &PgPool,
        profile_id: DbId,
    ) -> Result<Vec<Property>, sqlx::Error> {
        sqlx::query_as::<_, Property>(
            "SELECT p.id, p.agent_id, p.title, p.description, p.price, p.currency, p.location,
                    p.property_type, p.operation, p.bedrooms, p.bathrooms, p.area_m2, p.images,
                    p.status, p.is_promoted, p.created_at, p.updated_at
             FROM favorites f
             JOIN properties p ON p.id = f.property_id
             WHERE f.profile_id = $1
             ORDER BY f.created_at DESC, f.id DESC",
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
    }
}
