//! Sponsor administration and the cached public sponsor strip.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{
    body_json, delete_auth, get, get_auth, post_file_auth, post_json_auth, put_json_auth,
    token_for,
};
use sqlx::PgPool;

/// Names on the public strip, in display order.
async fn public_names(app: Router) -> Vec<String> {
    let json = body_json(get(app, "/api/v1/sponsors").await).await;
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect()
}

async fn create(app: Router, token: &str, body: serde_json::Value) -> i64 {
    let response = post_json_auth(app, "/api/v1/admin/sponsors", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_admins_manage_sponsors(pool: PgPool) {
    let agent = common::create_account(&pool, "patrocinio@example.com", "agent").await;
    let token = token_for(&agent);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/admin/sponsors",
        serde_json::json!({ "name": "Banco Industrial" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, "/api/v1/admin/sponsors", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_public_strip_follows_admin_writes(pool: PgPool) {
    let admin = common::create_admin(&pool, "marketing@example.com").await;
    let token = token_for(&admin);
    let app = common::build_test_app(pool);

    let banco = create(
        app.clone(),
        &token,
        serde_json::json!({
            "name": "Banco Industrial",
            "website_url": "https://bi.com.gt",
            "display_order": 2,
        }),
    )
    .await;
    create(
        app.clone(),
        &token,
        serde_json::json!({ "name": "Seguros Universales", "display_order": 1 }),
    )
    .await;

    common::eventually(|| {
        let app = app.clone();
        async move { public_names(app).await == ["Seguros Universales", "Banco Industrial"] }
    })
    .await;

    // Hidden sponsors leave the public strip but stay in the admin list.
    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/admin/sponsors/{banco}"),
        serde_json::json!({ "is_active": false }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_active"], false);

    common::eventually(|| {
        let app = app.clone();
        async move { public_names(app).await == ["Seguros Universales"] }
    })
    .await;
    let json = body_json(get_auth(app.clone(), "/api/v1/admin/sponsors", &token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let response = delete_auth(app.clone(), &format!("/api/v1/admin/sponsors/{banco}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(app, &format!("/api/v1/admin/sponsors/{banco}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sponsor_fields_validated(pool: PgPool) {
    let admin = common::create_admin(&pool, "validador@example.com").await;
    let token = token_for(&admin);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/admin/sponsors",
        serde_json::json!({ "name": "Ferretería", "website_url": "ftp://ferreteria.gt" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/admin/sponsors",
        serde_json::json!({ "name": "   " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        app,
        "/api/v1/admin/sponsors/999999",
        serde_json::json!({ "display_order": 3 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logo_upload(pool: PgPool) {
    let admin = common::create_admin(&pool, "logos@example.com").await;
    let token = token_for(&admin);
    let app = common::build_test_app(pool);

    let id = create(
        app.clone(),
        &token,
        serde_json::json!({ "name": "Cementos Progreso" }),
    )
    .await;
    let uri = format!("/api/v1/admin/sponsors/{id}/logo");

    let response = post_file_auth(app.clone(), &uri, "logo.webp", b"RIFF0000WEBPVP8 ", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let logo = json["data"]["logo_url"].as_str().unwrap().to_string();
    assert!(logo.starts_with(&format!("http://localhost:3000/storage/sponsors/{id}/")));

    common::eventually(|| {
        let app = app.clone();
        let logo = logo.clone();
        async move {
            let json = body_json(get(app, "/api/v1/sponsors").await).await;
            json["data"][0]["logo_url"] == logo.as_str()
        }
    })
    .await;

    let response = post_file_auth(app, &uri, "logo.gif", b"GIF89a", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
