//! Integration tests for agent plan assignment.
//!
//! - Reassignment deactivates exactly the previous active row
//! - Concurrent reassignments leave exactly one active row
//! - The partial unique index rejects a second active row written directly
//! - Purchased subscriptions follow the same one-active rule

use chrono::{Duration, Utc};
use sqlx::PgPool;
use inmo_db::models::profile::CreateProfile;
use inmo_db::models::subscription::CreateSubscription;
use inmo_db::models::tier_assignment::AssignTier;
use inmo_db::models::user::CreateUser;
use inmo_db::repositories::{
    ProfileRepo, SubscriptionRepo, TierAssignmentRepo, TierRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_agent(pool: &PgPool, email: &str) -> i64 {
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
            user_type: "agent".to_string(),
            full_name: "Agente".to_string(),
            phone: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn tier_id(pool: &PgPool, name: &str) -> i64 {
    TierRepo::find_by_name(pool, name).await.unwrap().unwrap().id
}

fn assign(agent_id: i64, tier_id: i64) -> AssignTier {
    AssignTier {
        agent_id,
        tier_id,
        billing_period: "monthly".to_string(),
        assigned_by: None,
    }
}

async fn active_count(pool: &PgPool, agent_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM agent_tier_assignments WHERE agent_id = $1 AND is_active",
    )
    .bind(agent_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reassignment_deactivates_previous(pool: PgPool) {
    let agent = new_agent(&pool, "a@example.com").await;
    let bronce = tier_id(&pool, "Bronce").await;
    let oro = tier_id(&pool, "Oro").await;

    let first = TierAssignmentRepo::assign(&pool, &assign(agent, bronce))
        .await
        .unwrap()
        .unwrap();
    let second = TierAssignmentRepo::assign(&pool, &assign(agent, oro))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(active_count(&pool, agent).await, 1);

    let history = TierAssignmentRepo::list_for_agent(&pool, agent).await.unwrap();
    assert_eq!(history.len(), 2);
    let old = history.iter().find(|a| a.id == first.id).unwrap();
    assert!(!old.is_active);
    assert!(old.deactivated_at.is_some());

    let active = TierAssignmentRepo::find_active(&pool, agent).await.unwrap().unwrap();
    assert_eq!(active.id, second.id);

    let plan = TierAssignmentRepo::find_active_plan(&pool, agent)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plan.tier_name, "Oro");
    assert_eq!(plan.property_limit, None);
}

/// Reassignment only touches the target agent's rows.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reassignment_is_per_agent(pool: PgPool) {
    let a = new_agent(&pool, "a@example.com").await;
    let b = new_agent(&pool, "b@example.com").await;
    let plata = tier_id(&pool, "Plata").await;

    TierAssignmentRepo::assign(&pool, &assign(a, plata)).await.unwrap();
    TierAssignmentRepo::assign(&pool, &assign(b, plata)).await.unwrap();
    TierAssignmentRepo::assign(&pool, &assign(a, plata)).await.unwrap();

    assert_eq!(active_count(&pool, a).await, 1);
    assert_eq!(active_count(&pool, b).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_reassignments_leave_one_active(pool: PgPool) {
    let agent = new_agent(&pool, "a@example.com").await;
    let bronce = tier_id(&pool, "Bronce").await;
    let platino = tier_id(&pool, "Platino").await;

    let mut handles = Vec::new();
    for i in 0..6 {
        let pool = pool.clone();
        let tier = if i % 2 == 0 { bronce } else { platino };
        handles.push(tokio::spawn(async move {
            TierAssignmentRepo::assign(&pool, &assign(agent, tier)).await
        }));
    }
    for result in futures::future::join_all(handles).await {
        assert!(result.unwrap().unwrap().is_some());
    }

    assert_eq!(active_count(&pool, agent).await, 1);
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM agent_tier_assignments WHERE agent_id = $1")
            .bind(agent)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(total, 6);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_index_rejects_second_active_row(pool: PgPool) {
    let agent = new_agent(&pool, "a@example.com").await;
    let oro = tier_id(&pool, "Oro").await;
    TierAssignmentRepo::assign(&pool, &assign(agent, oro)).await.unwrap();

    let err = sqlx::query(
        "INSERT INTO agent_tier_assignments (agent_id, tier_id, billing_period)
         VALUES ($1, $2, 'monthly')",
    )
    .bind(agent)
    .bind(oro)
    .execute(&pool)
    .await
    .unwrap_err();

    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.constraint(), Some("uq_agent_tier_assignments_one_active"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_assign_to_missing_agent(pool: PgPool) {
    let oro = tier_id(&pool, "Oro").await;
    let result = TierAssignmentRepo::assign(&pool, &assign(999_999, oro)).await.unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deactivate_assignment(pool: PgPool) {
    let agent = new_agent(&pool, "a@example.com").await;
    let oro = tier_id(&pool, "Oro").await;
    TierAssignmentRepo::assign(&pool, &assign(agent, oro)).await.unwrap();

    assert!(TierAssignmentRepo::deactivate(&pool, agent).await.unwrap());
    assert!(!TierAssignmentRepo::deactivate(&pool, agent).await.unwrap());
    assert!(TierAssignmentRepo::find_active_plan(&pool, agent)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_subscription_activation_replaces_previous(pool: PgPool) {
    let agent = new_agent(&pool, "a@example.com").await;
    let plata = TierRepo::find_by_name(&pool, "Plata").await.unwrap().unwrap();
    let now = Utc::now();

    let input = CreateSubscription {
        agent_id: agent,
        tier_id: plata.id,
        billing_period: "monthly".to_string(),
        amount_cents: plata.monthly_price_cents,
        current_period_start: now,
        current_period_end: now + Duration::days(30),
    };
    SubscriptionRepo::activate(&pool, &input).await.unwrap().unwrap();
    let second = SubscriptionRepo::activate(&pool, &input).await.unwrap().unwrap();

    let active = SubscriptionRepo::find_active(&pool, agent).await.unwrap().unwrap();
    assert_eq!(active.id, second.id);

    let plan = SubscriptionRepo::find_active_plan(&pool, agent)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plan.property_limit, Some(15));
}

/// An expired subscription no longer counts as an active plan.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_subscription_not_active(pool: PgPool) {
    let agent = new_agent(&pool, "a@example.com").await;
    let bronce = tier_id(&pool, "Bronce").await;
    let start = Utc::now() - Duration::days(40);

    SubscriptionRepo::activate(
        &pool,
        &CreateSubscription {
            agent_id: agent,
            tier_id: bronce,
            billing_period: "monthly".to_string(),
            amount_cents: 1999,
            current_period_start: start,
            current_period_end: start + Duration::days(30),
        },
    )
    .await
    .unwrap();

    assert!(SubscriptionRepo::find_active_plan(&pool, agent)
        .await
        .unwrap()
        .is_none());
}
