//! Integration tests for the agent registration moderation queue.

use sqlx::PgPool;
use inmo_db::models::profile::CreateProfile;
use inmo_db::models::user::{CreateUser, NewAccount};
use inmo_db::repositories::{ProfileRepo, RegistrationRepo, UserRepo};

async fn new_profile(pool: &PgPool, email: &str, user_type: &str) -> i64 {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap();
    ProfileRepo::create(
        pool,
        &CreateProfile {
            user_id: user.id,
            user_type: user_type.to_string(),
            full_name: email.to_string(),
            phone: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn user_type(pool: &PgPool, profile_id: i64) -> String {
    ProfileRepo::find_by_id(pool, profile_id)
        .await
        .unwrap()
        .unwrap()
        .user_type
}

/// Rejecting a pending registration must not touch the applicant's user type.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reject_leaves_user_type_unchanged(pool: PgPool) {
    let admin = new_profile(&pool, "admin@example.com", "admin").await;
    let applicant = new_profile(&pool, "agente@example.com", "client").await;
    let registration = RegistrationRepo::create(&pool, applicant, "agent").await.unwrap();

    let rejected = RegistrationRepo::reject(&pool, registration.id, admin, Some("Documentos incompletos"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(rejected.status, "rejected");
    assert_eq!(rejected.reviewed_by, Some(admin));
    assert_eq!(rejected.reason.as_deref(), Some("Documentos incompletos"));
    assert_eq!(user_type(&pool, applicant).await, "client");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_promotes_profile(pool: PgPool) {
    let admin = new_profile(&pool, "admin@example.com", "admin").await;
    let applicant = new_profile(&pool, "agente@example.com", "client").await;
    let registration = RegistrationRepo::create(&pool, applicant, "agent").await.unwrap();

    let approved = RegistrationRepo::approve(&pool, registration.id, admin)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(approved.status, "approved");
    assert!(approved.reviewed_at.is_some());
    assert_eq!(user_type(&pool, applicant).await, "agent");
}

/// Only pending rows transition; a reviewed row is left alone.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reviewed_registration_cannot_transition_again(pool: PgPool) {
    let admin = new_profile(&pool, "admin@example.com", "admin").await;
    let applicant = new_profile(&pool, "agente@example.com", "client").await;
    let registration = RegistrationRepo::create(&pool, applicant, "agent").await.unwrap();

    RegistrationRepo::reject(&pool, registration.id, admin, None)
        .await
        .unwrap()
        .unwrap();

    assert!(RegistrationRepo::approve(&pool, registration.id, admin)
        .await
        .unwrap()
        .is_none());
    assert_eq!(user_type(&pool, applicant).await, "client");
    assert_eq!(RegistrationRepo::count_pending(&pool).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_status(pool: PgPool) {
    let admin = new_profile(&pool, "admin@example.com", "admin").await;
    let first = new_profile(&pool, "uno@example.com", "client").await;
    let second = new_profile(&pool, "dos@example.com", "client").await;
    let r1 = RegistrationRepo::create(&pool, first, "agent").await.unwrap();
    RegistrationRepo::create(&pool, second, "agent").await.unwrap();
    RegistrationRepo::approve(&pool, r1.id, admin).await.unwrap();

    let pending = RegistrationRepo::list(&pool, Some("pending"), 50, 0).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].email, "dos@example.com");
    assert_eq!(pending[0].current_user_type, "client");

    let all = RegistrationRepo::list(&pool, None, 50, 0).await.unwrap();
    assert_eq!(all.len(), 2);
}

/// A profile can only have one registration row.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_one_registration_per_profile(pool: PgPool) {
    let applicant = new_profile(&pool, "agente@example.com", "client").await;
    RegistrationRepo::create(&pool, applicant, "agent").await.unwrap();
    let err = RegistrationRepo::create(&pool, applicant, "agent").await.unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.constraint()),
        Some("uq_pending_registrations_profile_id")
    );
}

fn account(email: &str, pending: Option<&str>) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        password_hash: "hash".to_string(),
        full_name: "Ana López".to_string(),
        phone: None,
        user_type: "client".to_string(),
        pending_user_type: pending.map(str::to_string),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_agent_queues_registration(pool: PgPool) {
    let account = UserRepo::register(&pool, &account("ana@example.com", Some("agent")))
        .await
        .unwrap();

    assert_eq!(account.profile.user_id, account.user.id);
    assert_eq!(account.profile.user_type, "client");
    let registration = account.registration.unwrap();
    assert_eq!(registration.profile_id, account.profile.id);
    assert_eq!(registration.status, "pending");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_duplicate_email_rolls_back(pool: PgPool) {
    UserRepo::register(&pool, &account("ana@example.com", None)).await.unwrap();

    let err = UserRepo::register(&pool, &account("ANA@example.com", Some("agent")))
        .await
        .unwrap_err();
    let constraint = err
        .as_database_error()
        .and_then(|e| e.constraint().map(str::to_string));
    assert_eq!(constraint.as_deref(), Some("uq_users_email"));

    let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(&pool)
        .await
        .unwrap();
    let registrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pending_registrations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((profiles, registrations), (1, 0));
}
