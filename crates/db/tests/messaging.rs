//! Integration tests for messages and notifications.

use sqlx::PgPool;
use inmo_db::models::message::CreateMessage;
use inmo_db::models::notification::CreateNotification;
use inmo_db::models::profile::CreateProfile;
use inmo_db::models::user::CreateUser;
use inmo_db::repositories::{MessageRepo, NotificationRepo, ProfileRepo, UserRepo};

async fn new_profile(pool: &PgPool, email: &str, name: &str) -> i64 {
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
            user_type: "client".to_string(),
            full_name: name.to_string(),
            phone: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn send(pool: &PgPool, from: i64, to: i64, body: &str) {
    MessageRepo::create(
        pool,
        &CreateMessage {
            sender_id: from,
            recipient_id: to,
            property_id: None,
            body: body.to_string(),
        },
    )
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_conversation_summaries(pool: PgPool) {
    let ana = new_profile(&pool, "ana@example.com", "Ana").await;
    let beto = new_profile(&pool, "beto@example.com", "Beto").await;
    let carla = new_profile(&pool, "carla@example.com", "Carla").await;

    send(&pool, beto, ana, "Hola Ana").await;
    send(&pool, beto, ana, "¿Sigue disponible?").await;
    send(&pool, ana, carla, "Buenas tardes").await;

    let summaries = MessageRepo::list_conversations(&pool, ana).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].counterpart_name, "Carla");
    assert_eq!(summaries[0].unread_count, 0);
    assert_eq!(summaries[1].counterpart_name, "Beto");
    assert_eq!(summaries[1].last_message, "¿Sigue disponible?");
    assert_eq!(summaries[1].unread_count, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_thread_order_and_read_marking(pool: PgPool) {
    let ana = new_profile(&pool, "ana@example.com", "Ana").await;
    let beto = new_profile(&pool, "beto@example.com", "Beto").await;

    send(&pool, beto, ana, "uno").await;
    send(&pool, ana, beto, "dos").await;
    send(&pool, beto, ana, "tres").await;

    let thread = MessageRepo::thread(&pool, ana, beto, 50, 0).await.unwrap();
    let bodies: Vec<&str> = thread.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["uno", "dos", "tres"]);

    assert_eq!(MessageRepo::mark_thread_read(&pool, ana, beto).await.unwrap(), 2);
    let summaries = MessageRepo::list_conversations(&pool, ana).await.unwrap();
    assert_eq!(summaries[0].unread_count, 0);

    // Beto's own outgoing messages were not marked.
    assert_eq!(MessageRepo::mark_thread_read(&pool, beto, ana).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cannot_message_self(pool: PgPool) {
    let ana = new_profile(&pool, "ana@example.com", "Ana").await;
    let result = MessageRepo::create(
        &pool,
        &CreateMessage {
            sender_id: ana,
            recipient_id: ana,
            property_id: None,
            body: "eco".to_string(),
        },
    )
    .await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notification_read_state(pool: PgPool) {
    let ana = new_profile(&pool, "ana@example.com", "Ana").await;
    let beto = new_profile(&pool, "beto@example.com", "Beto").await;

    let mut ids = Vec::new();
    for title in ["Registro aprobado", "Plan asignado"] {
        let n = NotificationRepo::create(
            &pool,
            &CreateNotification {
                profile_id: ana,
                kind: "test".to_string(),
                title: title.to_string(),
                body: None,
                link: None,
            },
        )
        .await
        .unwrap();
        ids.push(n.id);
    }

    assert_eq!(NotificationRepo::unread_count(&pool, ana).await.unwrap(), 2);
    // Another profile cannot mark Ana's notification.
    assert!(!NotificationRepo::mark_read(&pool, ids[0], beto).await.unwrap());
    assert!(NotificationRepo::mark_read(&pool, ids[0], ana).await.unwrap());

    let unread = NotificationRepo::list_for_profile(&pool, ana, true, 50, 0).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].title, "Plan asignado");

    assert_eq!(NotificationRepo::mark_all_read(&pool, ana).await.unwrap(), 1);
    assert_eq!(NotificationRepo::unread_count(&pool, ana).await.unwrap(), 0);
}
