//! In-app notifications: delivery from domain events, listing and read state.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, get_auth, post_auth, post_json_auth, token_for};
use inmo_db::models::notification::CreateNotification;
use inmo_db::repositories::NotificationRepo;
use sqlx::PgPool;

async fn unread(app: Router, token: &str) -> i64 {
    let json = body_json(get_auth(app, "/api/v1/notifications/unread-count", token).await).await;
    json["data"]["count"].as_i64().unwrap()
}

async fn seed(pool: &PgPool, profile_id: i64, title: &str) -> i64 {
    NotificationRepo::create(
        pool,
        &CreateNotification {
            profile_id,
            kind: "tier.assigned".to_string(),
            title: title.to_string(),
            body: None,
            link: Some("/dashboard".to_string()),
        },
    )
    .await
    .unwrap()
    .id
}

/// A direct message produces a notification for its recipient.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_message_notifies_recipient(pool: PgPool) {
    let agent = common::create_account(&pool, "avisos@example.com", "agent").await;
    let client = common::create_account(&pool, "pregunta@example.com", "client").await;
    let agent_token = token_for(&agent);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/messages",
        serde_json::json!({ "recipient_id": agent.id, "body": "¿Aceptan mascotas?" }),
        &token_for(&client),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    common::eventually(|| {
        let app = app.clone();
        let token = agent_token.clone();
        async move { unread(app, &token).await == 1 }
    })
    .await;

    let json = body_json(get_auth(app.clone(), "/api/v1/notifications", &agent_token).await).await;
    let first = &json["data"][0];
    assert_eq!(first["kind"], "message.received");
    assert_eq!(first["title"], "Nuevo mensaje de Test Person");
    assert_eq!(first["body"], "¿Aceptan mascotas?");
    assert_eq!(first["link"], format!("/messages?with={}", client.id));
    assert_eq!(first["is_read"], false);

    // The sender is not notified.
    assert_eq!(unread(app, &token_for(&client)).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mark_read_is_owner_only(pool: PgPool) {
    let owner = common::create_account(&pool, "lector@example.com", "agent").await;
    let other = common::create_account(&pool, "ajeno@example.com", "client").await;
    let id = seed(&pool, owner.id, "Se te asignó el plan Oro").await;
    let token = token_for(&owner);
    let app = common::build_test_app(pool);

    let uri = format!("/api/v1/notifications/{id}/read");
    let response = post_auth(app.clone(), &uri, &token_for(&other)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(unread(app.clone(), &token).await, 1);

    let response = post_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(unread(app.clone(), &token).await, 0);

    let json = body_json(get_auth(app, "/api/v1/notifications", &token).await).await;
    assert_eq!(json["data"][0]["is_read"], true);
    assert!(json["data"][0]["read_at"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_read_all_and_unread_filter(pool: PgPool) {
    let owner = common::create_account(&pool, "bandeja@example.com", "agent").await;
    seed(&pool, owner.id, "Primero").await;
    seed(&pool, owner.id, "Segundo").await;
    let token = token_for(&owner);
    let app = common::build_test_app(pool);

    let json = body_json(
        get_auth(app.clone(), "/api/v1/notifications?unread_only=true", &token).await,
    )
    .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let response = post_auth(app.clone(), "/api/v1/notifications/read-all", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["marked"], 2);

    let json = body_json(
        get_auth(app.clone(), "/api/v1/notifications?unread_only=true", &token).await,
    )
    .await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let json = body_json(get_auth(app, "/api/v1/notifications", &token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notifications_require_session(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = common::get(app, "/api/v1/notifications").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
