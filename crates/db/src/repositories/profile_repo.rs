//! Repository for the `profiles` table.

use sqlx::PgPool;
use inmo_core::types::DbId;

use crate::models::profile::{
    AdminUpdateUser, AdminUserRow, CreateProfile, Profile, ProfileWithEmail, SessionRow,
    UpdateProfile,
};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, user_id, user_type, role, full_name, phone, whatsapp, company, bio, \
                        avatar_url, show_email, show_phone, phone_verified, created_at, updated_at";

/// Same columns qualified with the `p` alias for joins.
const P_COLUMNS: &str = "p.id, p.user_id, p.user_type, p.role, p.full_name, p.phone, p.whatsapp, \
                          p.company, p.bio, p.avatar_url, p.show_email, p.show_phone, \
                          p.phone_verified, p.created_at, p.updated_at";

/// Provides CRUD operations for profiles.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Insert a new profile, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProfile) -> Result<Profile, sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles (user_id, user_type, full_name, phone)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(input.user_id)
            .bind(&input.user_type)
            .bind(&input.full_name)
            .bind(&input.phone)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load the session view of an identity (profile joined with e-mail and
    /// account status).
    pub async fn find_session_row(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        sqlx::query_as::<_, SessionRow>(
            "SELECT p.id AS profile_id, p.user_id, u.email, p.user_type, p.role, u.is_active
             FROM profiles p
             JOIN users u ON u.id = p.user_id
             WHERE p.user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Profile plus owner e-mail, before privacy flags are applied.
    pub async fn find_with_email(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ProfileWithEmail>, sqlx::Error> {
        let query = format!(
            "SELECT {P_COLUMNS}, u.email
             FROM profiles p
             JOIN users u ON u.id = p.user_id
             WHERE p.id = $1"
        );
        sqlx::query_as::<_, ProfileWithEmail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a profile. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!(
            "UPDATE profiles SET
                full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                whatsapp = COALESCE($4, whatsapp),
                company = COALESCE($5, company),
                bio = COALESCE($6, bio),
                avatar_url = COALESCE($7, avatar_url),
                show_email = COALESCE($8, show_email),
                show_phone = COALESCE($9, show_phone),
                phone_verified = CASE
                    WHEN $3 IS NOT NULL AND $3 IS DISTINCT FROM phone THEN false
                    ELSE phone_verified
                END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .bind(&input.full_name)
            .bind(&input.phone)
            .bind(&input.whatsapp)
            .bind(&input.company)
            .bind(&input.bio)
            .bind(&input.avatar_url)
            .bind(input.show_email)
            .bind(input.show_phone)
            .fetch_optional(pool)
            .await
    }

    /// Admin change of role and/or user type. Account activation lives on
    /// the identity and is applied in the same transaction.
    pub async fn admin_update(
        pool: &PgPool,
        id: DbId,
        input: &AdminUpdateUser,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE profiles SET
                role = COALESCE($2, role),
                user_type = COALESCE($3, user_type)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let profile = sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .bind(&input.role)
            .bind(&input.user_type)
            .fetch_optional(&mut *tx)
            .await?;

        if let (Some(profile), Some(is_active)) = (&profile, input.is_active) {
            sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
                .bind(profile.user_id)
                .bind(is_active)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(profile)
    }

    /// Admin listing of every profile with e-mail and active tier name.
    ///
    /// An admin assignment takes precedence over a purchased subscription.
    pub async fn list_for_admin(
        pool: &PgPool,
        user_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminUserRow>, sqlx::Error> {
        sqlx::query_as::<_, AdminUserRow>(
            "SELECT p.id AS profile_id, p.user_id, u.email, p.full_name, p.user_type, p.role,
                    u.is_active, plan.name AS active_tier, p.created_at
             FROM profiles p
             JOIN users u ON u.id = p.user_id
             LEFT JOIN LATERAL (
                 SELECT name FROM (
                     SELECT t.name, 0 AS priority
                     FROM agent_tier_assignments a
                     JOIN subscription_tiers t ON t.id = a.tier_id
                     WHERE a.agent_id = p.id AND a.is_active
                     UNION ALL
                     SELECT t.name, 1 AS priority
                     FROM agent_subscriptions s
                     JOIN subscription_tiers t ON t.id = s.tier_id
                     WHERE s.agent_id = p.id AND s.is_active AND s.current_period_end > NOW()
                 ) plans
                 ORDER BY priority
                 LIMIT 1
             ) plan ON true
             WHERE ($1::text IS NULL OR p.user_type = $1)
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
