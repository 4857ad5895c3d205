//! Refresh-token sessions (`user_sessions`).
//!
//! Only SHA-256 digests of refresh tokens are stored. A token is redeemed by
//! flipping `is_revoked` in the same statement that finds it, so a token can
//! be exchanged at most once.

use chrono::Duration;
use inmo_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{CreateSession, UserSession};

const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, is_revoked, \
                        user_agent, ip_address, created_at, updated_at";

pub struct SessionRepo;

impl SessionRepo {
    /// Store a freshly issued refresh token.
    pub async fn open(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// Consume a live refresh token. `None` when the digest is unknown,
    /// expired, or was already redeemed by another request.
    pub async fn redeem(pool: &PgPool, token_hash: &str) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "UPDATE user_sessions SET is_revoked = true
             WHERE refresh_token_hash = $1
               AND is_revoked = false
               AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Sign a user out everywhere. Returns how many sessions were closed.
    pub async fn close_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        sqlx::query(
            "UPDATE user_sessions SET is_revoked = true
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await
        .map(|done| done.rows_affected())
    }

    /// Drop sessions that ended more than `retain` ago, whether by expiry or
    /// by being redeemed or closed.
    pub async fn purge_ended(pool: &PgPool, retain: Duration) -> Result<u64, sqlx::Error> {
        sqlx::query(
            "DELETE FROM user_sessions
             WHERE (expires_at < NOW() OR is_revoked)
               AND updated_at < NOW() - make_interval(secs => $1)",
        )
        .bind(retain.num_seconds() as f64)
        .execute(pool)
        .await
        .map(|done| done.rows_affected())
    }
}
