//! Refresh sessions: single redemption and purging.

use chrono::{Duration, Utc};
use inmo_db::models::session::CreateSession;
use inmo_db::models::user::CreateUser;
use inmo_db::repositories::{SessionRepo, UserRepo};
use sqlx::PgPool;

async fn new_user(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            email: "sesion@example.com".to_string(),
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn open(pool: &PgPool, user_id: i64, hash: &str, expires_in: Duration) {
    SessionRepo::open(
        pool,
        &CreateSession {
            user_id,
            refresh_token_hash: hash.to_string(),
            expires_at: Utc::now() + expires_in,
            user_agent: None,
            ip_address: None,
        },
    )
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_token_redeems_once(pool: PgPool) {
    let user_id = new_user(&pool).await;
    open(&pool, user_id, "digest-a", Duration::days(30)).await;
    open(&pool, user_id, "digest-old", Duration::days(-1)).await;

    let session = SessionRepo::redeem(&pool, "digest-a").await.unwrap().unwrap();
    assert_eq!(session.user_id, user_id);
    assert!(session.is_revoked);
    assert!(SessionRepo::redeem(&pool, "digest-a").await.unwrap().is_none());

    assert!(SessionRepo::redeem(&pool, "digest-old").await.unwrap().is_none());
    assert!(SessionRepo::redeem(&pool, "unknown").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_close_all_then_purge(pool: PgPool) {
    let user_id = new_user(&pool).await;
    open(&pool, user_id, "digest-1", Duration::days(30)).await;
    open(&pool, user_id, "digest-2", Duration::days(30)).await;

    assert_eq!(SessionRepo::close_all_for_user(&pool, user_id).await.unwrap(), 2);
    assert_eq!(SessionRepo::close_all_for_user(&pool, user_id).await.unwrap(), 0);

    // Just closed, so still inside a one-hour retention window.
    assert_eq!(SessionRepo::purge_ended(&pool, Duration::hours(1)).await.unwrap(), 0);
    assert_eq!(SessionRepo::purge_ended(&pool, Duration::zero()).await.unwrap(), 2);
}
