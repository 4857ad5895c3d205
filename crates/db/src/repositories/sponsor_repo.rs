//! Repository for the `sponsors` table.

use sqlx::PgPool;
use inmo_core::types::DbId;

use crate::models::sponsor::{CreateSponsor, Sponsor, UpdateSponsor};

const COLUMNS: &str =
    "id, name, logo_url, website_url, display_order, is_active, created_at, updated_at";

pub struct SponsorRepo;

impl SponsorRepo {
    pub async fn create(pool: &PgPool, input: &CreateSponsor) -> Result<Sponsor, sqlx::Error> {
        let query = format!(
            "INSERT INTO sponsors (name, logo_url, website_url, display_order, is_active)
             VALUES ($1, $2, $3, COALESCE($4, 0), COALESCE($5, true))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sponsor>(&query)
            .bind(&input.name)
            .bind(&input.logo_url)
            .bind(&input.website_url)
            .bind(input.display_order)
            .bind(input.is_active)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Sponsor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sponsors WHERE id = $1");
        sqlx::query_as::<_, Sponsor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every sponsor, active or not, in display order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Sponsor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sponsors ORDER BY display_order, id");
        sqlx::query_as::<_, Sponsor>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSponsor,
    ) -> Result<Option<Sponsor>, sqlx::Error> {
        let query = format!(
            "UPDATE sponsors SET
                name = COALESCE($2, name),
                website_url = COALESCE($3, website_url),
                display_order = COALESCE($4, display_order),
                is_active = COALESCE($5, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sponsor>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.website_url)
            .bind(input.display_order)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_logo(
        pool: &PgPool,
        id: DbId,
        logo_url: &str,
    ) -> Result<Option<Sponsor>, sqlx::Error> {
        let query = format!(
            "UPDATE sponsors SET logo_url = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Sponsor>(&query)
            .bind(id)
            .bind(logo_url)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sponsors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
