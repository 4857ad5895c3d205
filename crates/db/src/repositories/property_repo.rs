//! Repository for the `properties` table.

use sqlx::{PgConnection, PgPool};
use inmo_core::property::STATUS_ACTIVE;
use inmo_core::types::DbId;

use crate::models::property::{
    CappedWrite, CreateProperty, Property, PropertySearch, StatusCounts, UpdateProperty,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, agent_id, title, description, price, currency, location, \
                        property_type, operation, bedrooms, bathrooms, area_m2, images, \
                        status, is_promoted, created_at, updated_at";

/// Provides CRUD and feed queries for property listings.
pub struct PropertyRepo;

impl PropertyRepo {
    /// Insert a new listing (always `active`), returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProperty) -> Result<Property, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut conn, input).await
    }

    /// Insert a new listing unless the agent already has `limit` active ones.
    ///
    /// The agent's profile row is locked for the count and the insert, so
    /// concurrent publishes for one agent serialize and the cap holds. A
    /// `None` limit means unlimited.
    pub async fn create_capped(
        pool: &PgPool,
        input: &CreateProperty,
        limit: Option<i64>,
    ) -> Result<CappedWrite<Property>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if let Some(blocked) = Self::check_capacity(&mut tx, input.agent_id, None, limit).await? {
            return Ok(blocked);
        }
        let property = Self::insert(&mut tx, input).await?;

        tx.commit().await?;
        Ok(CappedWrite::Written(property))
    }

    /// Set a listing `active` under the same lock and cap as
    /// [`create_capped`](Self::create_capped). The listing itself is left
    /// out of the count.
    pub async fn activate_capped(
        pool: &PgPool,
        id: DbId,
        agent_id: DbId,
        limit: Option<i64>,
    ) -> Result<CappedWrite<Property>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if let Some(blocked) = Self::check_capacity(&mut tx, agent_id, Some(id), limit).await? {
            return Ok(blocked);
        }
        let query = format!(
            "UPDATE properties SET status = $3
             WHERE id = $1 AND agent_id = $2
             RETURNING {COLUMNS}"
        );
        let property = sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .bind(agent_id)
            .bind(STATUS_ACTIVE)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(property) = property else {
            return Ok(CappedWrite::Missing);
        };
        tx.commit().await?;
        Ok(CappedWrite::Written(property))
    }

    /// Lock the agent's profile and count its active listings. Returns the
    /// refusal when the agent is missing or already at `limit`.
    async fn check_capacity(
        conn: &mut PgConnection,
        agent_id: DbId,
        excluding: Option<DbId>,
        limit: Option<i64>,
    ) -> Result<Option<CappedWrite<Property>>, sqlx::Error> {
        let locked: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM profiles WHERE id = $1 FOR UPDATE")
                .bind(agent_id)
                .fetch_optional(&mut *conn)
                .await?;
        if locked.is_none() {
            return Ok(Some(CappedWrite::Missing));
        }

        let Some(limit) = limit else {
            return Ok(None);
        };
        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM properties
             WHERE agent_id = $1 AND status = $2 AND ($3::BIGINT IS NULL OR id <> $3)",
        )
        .bind(agent_id)
        .bind(STATUS_ACTIVE)
        .bind(excluding)
        .fetch_one(&mut *conn)
        .await?;

        Ok((active >= limit).then_some(CappedWrite::LimitReached { active }))
    }

    async fn insert(
        conn: &mut PgConnection,
        input: &CreateProperty,
    ) -> Result<Property, sqlx::Error> {
        let query = format!(
            "INSERT INTO properties
                (agent_id, title, description, price, currency, location, property_type,
                 operation, bedrooms, bathrooms, area_m2, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(input.agent_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.currency)
            .bind(&input.location)
            .bind(&input.property_type)
            .bind(&input.operation)
            .bind(input.bedrooms)
            .bind(input.bathrooms)
            .bind(input.area_m2)
            .bind(&input.images)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Property>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM properties WHERE id = $1");
        sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Public feed: active listings, newest first.
    pub async fn list_feed(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Property>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM properties
             WHERE status = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(STATUS_ACTIVE)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Active, promoted listings, newest first.
    pub async fn list_featured(pool: &PgPool, limit: i64) -> Result<Vec<Property>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM properties
             WHERE status = $1 AND is_promoted = true
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(STATUS_ACTIVE)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Search active listings.
    ///
    /// Every pattern must match at least one of title, location, description
    /// or property type. Promoted listings sort first.
    pub async fn search(
        pool: &PgPool,
        filters: &PropertySearch,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Property>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM properties
             WHERE status = $1
               AND NOT EXISTS (
                   SELECT 1 FROM unnest($2::text[]) AS pattern
                   WHERE NOT (
                       title ILIKE pattern
                       OR location ILIKE pattern
                       OR COALESCE(description, '') ILIKE pattern
                       OR property_type ILIKE pattern
                   )
               )
               AND ($3::bigint IS NULL OR price >= $3)
               AND ($4::bigint IS NULL OR price <= $4)
               AND ($5::int IS NULL OR bedrooms >= $5)
               AND ($6::text IS NULL OR operation = $6)
               AND ($7::text IS NULL OR property_type = $7)
             ORDER BY is_promoted DESC, created_at DESC, id DESC
             LIMIT $8 OFFSET $9"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(STATUS_ACTIVE)
            .bind(&filters.patterns)
            .bind(filters.min_price)
            .bind(filters.max_price)
            .bind(filters.min_bedrooms)
            .bind(&filters.operation)
            .bind(&filters.property_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every listing of one agent, any status, newest first.
    pub async fn list_by_agent(
        pool: &PgPool,
        agent_id: DbId,
    ) -> Result<Vec<Property>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM properties
             WHERE agent_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(agent_id)
            .fetch_all(pool)
            .await
    }

    /// Active listings of one agent, for the public portfolio.
    pub async fn list_active_by_agent(
        pool: &PgPool,
        agent_id: DbId,
    ) -> Result<Vec<Property>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM properties
             WHERE agent_id = $1 AND status = $2
             ORDER BY is_promoted DESC, created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(agent_id)
            .bind(STATUS_ACTIVE)
            .fetch_all(pool)
            .await
    }

    /// Admin listing, optionally filtered by status.
    pub async fn list_all(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Property>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM properties
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_active_by_agent(pool: &PgPool, agent_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE agent_id = $1 AND status = $2")
            .bind(agent_id)
            .bind(STATUS_ACTIVE)
            .fetch_one(pool)
            .await
    }

    /// Per-status listing counts for one agent's dashboard.
    pub async fn status_counts_by_agent(
        pool: &PgPool,
        agent_id: DbId,
    ) -> Result<StatusCounts, sqlx::Error> {
        sqlx::query_as::<_, StatusCounts>(
            "SELECT
                COUNT(*) FILTER (WHERE status = 'active') AS active,
                COUNT(*) FILTER (WHERE status = 'paused') AS paused,
                COUNT(*) FILTER (WHERE status = 'sold') AS sold,
                COUNT(*) FILTER (WHERE status = 'rented') AS rented
             FROM properties
             WHERE agent_id = $1",
        )
        .bind(agent_id)
        .fetch_one(pool)
        .await
    }

    /// Update a listing. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProperty,
    ) -> Result<Option<Property>, sqlx::Error> {
        let query = format!(
            "UPDATE properties SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                currency = COALESCE($5, currency),
                location = COALESCE($6, location),
                property_type = COALESCE($7, property_type),
                operation = COALESCE($8, operation),
                bedrooms = COALESCE($9, bedrooms),
                bathrooms = COALESCE($10, bathrooms),
                area_m2 = COALESCE($11, area_m2)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.price)
            .bind(&input.currency)
            .bind(&input.location)
            .bind(&input.property_type)
            .bind(&input.operation)
            .bind(input.bedrooms)
            .bind(input.bathrooms)
            .bind(input.area_m2)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Property>, sqlx::Error> {
        let query = format!(
            "UPDATE properties SET status = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Flip `is_promoted`.
    pub async fn toggle_promoted(pool: &PgPool, id: DbId) -> Result<Option<Property>, sqlx::Error> {
        let query = format!(
            "UPDATE properties SET is_promoted = NOT is_promoted
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Append an uploaded image URL to the listing's gallery.
    pub async fn append_image(
        pool: &PgPool,
        id: DbId,
        url: &str,
    ) -> Result<Option<Property>, sqlx::Error> {
        let query = format!(
            "UPDATE properties SET images = array_append(images, $2)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .bind(url)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete a listing. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
