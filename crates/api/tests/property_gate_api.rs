//! The publication gate as seen through the listing endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, listing_body, post_auth, post_json_auth, token_for};
use inmo_core::property::MAX_IMAGES_PER_PROPERTY;
use inmo_db::models::profile::AdminUpdateUser;
use inmo_db::models::property::CreateProperty;
use inmo_db::repositories::{ProfileRepo, PropertyRepo};
use sqlx::PgPool;

async fn seed_listing(pool: &PgPool, agent_id: i64, title: &str) -> i64 {
    PropertyRepo::create(
        pool,
        &CreateProperty {
            agent_id,
            title: title.to_string(),
            description: None,
            price: 250_000,
            currency: "USD".to_string(),
            location: "Zona 10".to_string(),
            property_type: "apartment".to_string(),
            operation: "sale".to_string(),
            bedrooms: Some(2),
            bathrooms: Some(1),
            area_m2: Some(80.0),
            images: vec![],
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Denials
// ---------------------------------------------------------------------------

/// An agent with no plan is sent to the subscription page.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_agent_without_plan_gets_402(pool: PgPool) {
    let agent = common::create_account(&pool, "sinplan@example.com", "agent").await;
    let token = token_for(&agent);
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(
        app,
        "/api/v1/properties",
        listing_body("Casa en Zona 15", 300_000, "Zona 15"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "SUBSCRIPTION_REQUIRED");
    assert_eq!(json["redirect"], "/subscription");
    assert_eq!(PropertyRepo::count_active_by_agent(&pool, agent.id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_client_cannot_publish(pool: PgPool) {
    let client = common::create_account(&pool, "cliente@example.com", "client").await;
    let token = token_for(&client);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/properties",
        listing_body("Apartamento", 90_000, "Mixco"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_gate_reports_missing_plan(pool: PgPool) {
    let agent = common::create_account(&pool, "gate@example.com", "agent").await;
    let token = token_for(&agent);
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/subscription/gate", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["decision"], "no_subscription");
    assert_eq!(json["data"]["redirect"], "/subscription");
}

/// Holding the admin role does not exempt an agent from needing a plan.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_agent_with_admin_role_still_needs_plan(pool: PgPool) {
    let agent = common::create_account(&pool, "agente-admin@example.com", "agent").await;
    ProfileRepo::admin_update(
        &pool,
        agent.id,
        &AdminUpdateUser {
            role: Some("admin".to_string()),
            user_type: None,
            is_active: None,
        },
    )
    .await
    .unwrap()
    .unwrap();
    let token = token_for(&agent);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/properties",
        listing_body("Casa en Zona 16", 400_000, "Zona 16"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let gate = body_json(get_auth(app, "/api/v1/subscription/gate", &token).await).await;
    assert_eq!(gate["data"]["decision"], "no_subscription");
}

/// Ownership is checked before the plan: another agent's listing is 403
/// even for an agent without a plan.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_activate_checks_ownership_first(pool: PgPool) {
    let owner = common::create_account(&pool, "duena@example.com", "agent").await;
    common::assign_tier(&pool, owner.id, "Oro").await;
    let id = seed_listing(&pool, owner.id, "Casa pausada").await;
    PropertyRepo::set_status(&pool, id, "paused").await.unwrap();
    let stranger = common::create_account(&pool, "extrano@example.com", "agent").await;
    let app = common::build_test_app(pool);

    let response = post_auth(
        app,
        &format!("/api/v1/properties/{id}/activate"),
        &token_for(&stranger),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Listing validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_gallery_must_hold_http_urls(pool: PgPool) {
    let agent = common::create_account(&pool, "galeria@example.com", "agent").await;
    common::assign_tier(&pool, agent.id, "Oro").await;
    let token = token_for(&agent);
    let app = common::build_test_app(pool.clone());

    let mut body = listing_body("Casa con galería", 200_000, "Zona 10");
    body["images"] = serde_json::json!(["javascript:alert(0)"]);
    let response = post_json_auth(app.clone(), "/api/v1/properties", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = listing_body("Casa con galería", 200_000, "Zona 10");
    body["images"] =
        serde_json::json!(vec!["https://cdn.example.com/f.jpg"; MAX_IMAGES_PER_PROPERTY + 1]);
    let response = post_json_auth(app.clone(), "/api/v1/properties", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(PropertyRepo::count_active_by_agent(&pool, agent.id).await.unwrap(), 0);

    let mut body = listing_body("Casa con galería", 200_000, "Zona 10");
    body["images"] = serde_json::json!(["https://cdn.example.com/portada.jpg"]);
    let response = post_json_auth(app, "/api/v1/properties", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["cover_image"], "https://cdn.example.com/portada.jpg");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_padded_text_is_validated_after_trimming(pool: PgPool) {
    let agent = common::create_account(&pool, "espacios@example.com", "agent").await;
    common::assign_tier(&pool, agent.id, "Oro").await;
    let token = token_for(&agent);
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(
        app.clone(),
        "/api/v1/properties",
        listing_body("   a   ", 200_000, "Zona 10"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/properties",
        listing_body("Casa bonita", 200_000, "    "),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(PropertyRepo::count_active_by_agent(&pool, agent.id).await.unwrap(), 0);

    let response = post_json_auth(
        app,
        "/api/v1/properties",
        listing_body("  Casa bonita  ", 200_000, " Zona 10 "),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Casa bonita");
    assert_eq!(json["data"]["location"], "Zona 10");
}

// ---------------------------------------------------------------------------
// Bypasses
// ---------------------------------------------------------------------------

/// The configured super admin publishes without any plan.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_super_admin_bypass(pool: PgPool) {
    let owner = common::create_account(&pool, common::SUPER_ADMIN_EMAIL, "client").await;
    let token = token_for(&owner);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/properties",
        listing_body("Terreno en Antigua", 120_000, "Antigua Guatemala"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["agent_id"], owner.id);
    assert_eq!(json["data"]["status"], "active");
    assert_eq!(json["data"]["cover_image"], "/placeholder.svg");

    let gate = body_json(get_auth(app, "/api/v1/subscription/gate", &token).await).await;
    assert_eq!(gate["data"]["decision"], "super_admin_bypass");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_role_bypass(pool: PgPool) {
    let admin = common::create_admin(&pool, "admin@example.com").await;
    let token = token_for(&admin);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/properties",
        listing_body("Oficina", 500_000, "Zona 4"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Plan limits
// ---------------------------------------------------------------------------

/// Bronce allows five active listings; paused ones do not count, but
/// re-activating one is checked against the limit again.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bronce_limit(pool: PgPool) {
    let agent = common::create_account(&pool, "bronce@example.com", "agent").await;
    common::assign_tier(&pool, agent.id, "Bronce").await;
    let mut ids = Vec::new();
    for n in 0..5 {
        ids.push(seed_listing(&pool, agent.id, &format!("Listado {n}")).await);
    }
    let token = token_for(&agent);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/properties",
        listing_body("Sexto listado", 100_000, "Zona 1"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let gate = body_json(get_auth(app.clone(), "/api/v1/subscription/gate", &token).await).await;
    assert_eq!(gate["data"]["decision"], "limit_reached");
    assert_eq!(gate["data"]["active_properties"], 5);

    let response = post_auth(app.clone(), &format!("/api/v1/properties/{}/pause", ids[0]), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/properties",
        listing_body("Sexto listado", 100_000, "Zona 1"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response =
        post_auth(app, &format!("/api/v1/properties/{}/activate", ids[0]), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Oro has no limit.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unlimited_plan_reports_no_remaining(pool: PgPool) {
    let agent = common::create_account(&pool, "oro@example.com", "agent").await;
    common::assign_tier(&pool, agent.id, "Oro").await;
    for n in 0..6 {
        seed_listing(&pool, agent.id, &format!("Oro {n}")).await;
    }
    let token = token_for(&agent);
    let app = common::build_test_app(pool);

    let gate = body_json(get_auth(app, "/api/v1/subscription/gate", &token).await).await;
    assert_eq!(gate["data"]["decision"], "has_subscription");
    assert_eq!(gate["data"]["plan"]["tier_name"], "Oro");
    assert!(gate["data"]["remaining"].is_null());
}

/// Parallel publishes from one agent cannot overshoot the plan's limit.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_creates_respect_limit(pool: PgPool) {
    let agent = common::create_account(&pool, "rafaga@example.com", "agent").await;
    common::assign_tier(&pool, agent.id, "Bronce").await;
    let token = token_for(&agent);
    let app = common::build_test_app(pool.clone());

    let mut handles = Vec::new();
    for n in 0..20 {
        let app = app.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            post_json_auth(
                app,
                "/api/v1/properties",
                listing_body(&format!("Ráfaga {n}"), 150_000, "Zona 11"),
                &token,
            )
            .await
            .status()
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::FORBIDDEN => {}
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(created, 5);
    assert_eq!(PropertyRepo::count_active_by_agent(&pool, agent.id).await.unwrap(), 5);
}

/// Parallel re-activations are held to the same limit.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_activations_respect_limit(pool: PgPool) {
    let agent = common::create_account(&pool, "reactiva@example.com", "agent").await;
    common::assign_tier(&pool, agent.id, "Bronce").await;
    for n in 0..4 {
        seed_listing(&pool, agent.id, &format!("Activo {n}")).await;
    }
    let mut paused = Vec::new();
    for n in 0..3 {
        let id = seed_listing(&pool, agent.id, &format!("Pausado {n}")).await;
        PropertyRepo::set_status(&pool, id, "paused").await.unwrap();
        paused.push(id);
    }
    let token = token_for(&agent);
    let app = common::build_test_app(pool.clone());

    let mut handles = Vec::new();
    for id in paused {
        let app = app.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            post_auth(app, &format!("/api/v1/properties/{id}/activate"), &token)
                .await
                .status()
        }));
    }

    let mut activated = 0;
    for handle in handles {
        if handle.await.unwrap() == StatusCode::OK {
            activated += 1;
        }
    }
    assert_eq!(activated, 1);
    assert_eq!(PropertyRepo::count_active_by_agent(&pool, agent.id).await.unwrap(), 5);
}
