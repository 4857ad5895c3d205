//! Repository for the `users` table.

use sqlx::PgPool;
use inmo_core::types::{DbId, Timestamp};

use crate::models::profile::Profile;
use crate::models::registration::PendingRegistration;
use crate::models::user::{CreateUser, NewAccount, RegisteredAccount, User};
use crate::repositories::{profile_repo, registration_repo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, is_active, last_login_at, \
                        failed_login_count, locked_until, created_at, updated_at";

/// Provides CRUD operations for auth identities.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new identity, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .fetch_one(pool)
            .await
    }

    /// Create identity, profile and optional registration request in one
    /// transaction. A duplicate e-mail fails on `uq_users_email`.
    pub async fn register(
        pool: &PgPool,
        input: &NewAccount,
    ) -> Result<RegisteredAccount, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO users (email, password_hash)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO profiles (user_id, user_type, full_name, phone)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            profile_repo::COLUMNS
        );
        let profile = sqlx::query_as::<_, Profile>(&query)
            .bind(user.id)
            .bind(&input.user_type)
            .bind(&input.full_name)
            .bind(&input.phone)
            .fetch_one(&mut *tx)
            .await?;

        let registration = match &input.pending_user_type {
            Some(requested) => {
                let query = format!(
                    "INSERT INTO pending_registrations (profile_id, requested_user_type)
                     VALUES ($1, $2)
                     RETURNING {}",
                    registration_repo::COLUMNS
                );
                let row = sqlx::query_as::<_, PendingRegistration>(&query)
                    .bind(profile.id)
                    .bind(requested)
                    .fetch_one(&mut *tx)
                    .await?;
                Some(row)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(RegisteredAccount {
            user,
            profile,
            registration,
        })
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an identity by e-mail (case-insensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Increment the failed login counter, returning the new count.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE users SET failed_login_count = failed_login_count + 1
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// Lock an account until the given timestamp.
    pub async fn lock_account(pool: &PgPool, id: DbId, until: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a successful login: reset the failure counter, clear the lock
    /// and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
