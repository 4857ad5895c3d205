//! Repository for the `phone_verifications` table.

use sqlx::PgPool;
use inmo_core::types::{DbId, Timestamp};

use crate::models::phone_verification::PhoneVerification;

const COLUMNS: &str = "id, user_id, phone, code_hash, expires_at, attempts, consumed_at, \
                       created_at, updated_at";

pub struct PhoneVerificationRepo;

impl PhoneVerificationRepo {
    /// Issue a new code. Earlier unconsumed codes for the identity are
    /// consumed so only the newest one can be used.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        phone: &str,
        code_hash: &str,
        expires_at: Timestamp,
    ) -> Result<PhoneVerification, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE phone_verifications SET consumed_at = NOW()
             WHERE user_id = $1 AND consumed_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO phone_verifications (user_id, phone, code_hash, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, PhoneVerification>(&query)
            .bind(user_id)
            .bind(phone)
            .bind(code_hash)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Most recently issued code for an identity, consumed or not.
    pub async fn find_latest(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<PhoneVerification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM phone_verifications
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, PhoneVerification>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Spend one attempt on a code that is still open.
    ///
    /// The count is checked and bumped in one statement, so concurrent
    /// guesses cannot exceed `max_attempts`. Returns the stored digest to
    /// compare against, or `None` if no attempt was left or the code is
    /// consumed or expired.
    pub async fn claim_attempt(
        pool: &PgPool,
        id: DbId,
        max_attempts: i32,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE phone_verifications SET attempts = attempts + 1
             WHERE id = $1 AND attempts < $2 AND consumed_at IS NULL AND expires_at > NOW()
             RETURNING code_hash",
        )
        .bind(id)
        .bind(max_attempts)
        .fetch_optional(pool)
        .await
    }

    /// Consume the code and mark the owner's phone verified, atomically.
    ///
    /// Returns `false` if the code was consumed concurrently.
    pub async fn consume_and_verify(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let phone: Option<String> = sqlx::query_scalar(
            "UPDATE phone_verifications SET consumed_at = NOW()
             WHERE id = $1 AND user_id = $2 AND consumed_at IS NULL
             RETURNING phone",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(phone) = phone else {
            return Ok(false);
        };

        sqlx::query("UPDATE profiles SET phone = $2, phone_verified = true WHERE user_id = $1")
            .bind(user_id)
            .bind(phone)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
