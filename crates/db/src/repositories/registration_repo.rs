//! Repository for the `pending_registrations` table.

use sqlx::PgPool;
use inmo_core::registration::{REGISTRATION_APPROVED, REGISTRATION_PENDING, REGISTRATION_REJECTED};
use inmo_core::types::DbId;

use crate::models::registration::{PendingRegistration, RegistrationListItem};

pub(crate) const COLUMNS: &str = "id, profile_id, requested_user_type, status, reason, reviewed_by, \
                        reviewed_at, created_at, updated_at";

const R_COLUMNS: &str = "r.id, r.profile_id, r.requested_user_type, r.status, r.reason, \
                          r.reviewed_by, r.reviewed_at, r.created_at, r.updated_at";

pub struct RegistrationRepo;

impl RegistrationRepo {
    pub async fn create(
        pool: &PgPool,
        profile_id: DbId,
        requested_user_type: &str,
    ) -> Result<PendingRegistration, sqlx::Error> {
        let query = format!(
            "INSERT INTO pending_registrations (profile_id, requested_user_type)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingRegistration>(&query)
            .bind(profile_id)
            .bind(requested_user_type)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PendingRegistration>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pending_registrations WHERE id = $1");
        sqlx::query_as::<_, PendingRegistration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_profile(
        pool: &PgPool,
        profile_id: DbId,
    ) -> Result<Option<PendingRegistration>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pending_registrations WHERE profile_id = $1");
        sqlx::query_as::<_, PendingRegistration>(&query)
            .bind(profile_id)
            .fetch_optional(pool)
            .await
    }

    /// Moderation queue, oldest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RegistrationListItem>, sqlx::Error> {
        let query = format!(
            "SELECT {R_COLUMNS}, p.full_name, u.email, p.user_type AS current_user_type
             FROM pending_registrations r
             JOIN profiles p ON p.id = r.profile_id
             JOIN users u ON u.id = p.user_id
             WHERE ($1::text IS NULL OR r.status = $1)
             ORDER BY r.created_at, r.id
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, RegistrationListItem>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Approve a pending registration and promote the profile to the
    /// requested user type, atomically.
    ///
    /// Returns `None` if the row is missing or no longer pending.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        reviewer_id: DbId,
    ) -> Result<Option<PendingRegistration>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE pending_registrations
             SET status = $3, reviewed_by = $2, reviewed_at = NOW()
             WHERE id = $1 AND status = $4
             RETURNING {COLUMNS}"
        );
        let registration = sqlx::query_as::<_, PendingRegistration>(&query)
            .bind(id)
            .bind(reviewer_id)
            .bind(REGISTRATION_APPROVED)
            .bind(REGISTRATION_PENDING)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(registration) = registration else {
            return Ok(None);
        };

        sqlx::query("UPDATE profiles SET user_type = $2 WHERE id = $1")
            .bind(registration.profile_id)
            .bind(&registration.requested_user_type)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(registration))
    }

    /// Reject a pending registration. The profile is left untouched.
    ///
    /// Returns `None` if the row is missing or no longer pending.
    pub async fn reject(
        pool: &PgPool,
        id: DbId,
        reviewer_id: DbId,
        reason: Option<&str>,
    ) -> Result<Option<PendingRegistration>, sqlx::Error> {
        let query = format!(
            "UPDATE pending_registrations
             SET status = $3, reviewed_by = $2, reviewed_at = NOW(), reason = $5
             WHERE id = $1 AND status = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingRegistration>(&query)
            .bind(id)
            .bind(reviewer_id)
            .bind(REGISTRATION_REJECTED)
            .bind(REGISTRATION_PENDING)
            .bind(reason)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM pending_registrations WHERE status = $1")
            .bind(REGISTRATION_PENDING)
            .fetch_one(pool)
            .await
    }
}
