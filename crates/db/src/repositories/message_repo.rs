//! Repository for the `messages` table.

use sqlx::PgPool;
use inmo_core::types::DbId;

use crate::models::message::{ConversationSummary, CreateMessage, Message};

const COLUMNS: &str =
    "id, sender_id, recipient_id, property_id, body, read_at, created_at, updated_at";

pub struct MessageRepo;

impl MessageRepo {
    pub async fn create(pool: &PgPool, input: &CreateMessage) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages (sender_id, recipient_id, property_id, body)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(input.sender_id)
            .bind(input.recipient_id)
            .bind(input.property_id)
            .bind(&input.body)
            .fetch_one(pool)
            .await
    }

    /// One summary per counterpart, most recent conversation first.
    pub async fn list_conversations(
        pool: &PgPool,
        profile_id: DbId,
    ) -> Result<Vec<ConversationSummary>, sqlx::Error> {
        sqlx::query_as::<_, ConversationSummary>(
            "SELECT * FROM (
                SELECT DISTINCT ON (c.counterpart_id)
                       c.counterpart_id,
                       p.full_name AS counterpart_name,
                       c.body AS last_message,
                       c.created_at AS last_message_at,
                       (SELECT COUNT(*) FROM messages u
                        WHERE u.sender_id = c.counterpart_id
                          AND u.recipient_id = $1
                          AND u.read_at IS NULL) AS unread_count
                FROM (
                    SELECT m.id, m.body, m.created_at,
                           CASE WHEN m.sender_id = $1 THEN m.recipient_id ELSE m.sender_id END
                               AS counterpart_id
                    FROM messages m
                    WHERE m.sender_id = $1 OR m.recipient_id = $1
                ) c
                JOIN profiles p ON p.id = c.counterpart_id
                ORDER BY c.counterpart_id, c.created_at DESC, c.id DESC
             ) summaries
             ORDER BY last_message_at DESC",
        )
        .bind(profile_id)
        .fetch_all(pool)
        .await
    }

    /// Messages exchanged between two profiles, oldest first.
    pub async fn thread(
        pool: &PgPool,
        profile_id: DbId,
        counterpart_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE (sender_id = $1 AND recipient_id = $2)
                OR (sender_id = $2 AND recipient_id = $1)
             ORDER BY created_at, id
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(profile_id)
            .bind(counterpart_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Mark every message from `counterpart_id` to `profile_id` as read.
    pub async fn mark_thread_read(
        pool: &PgPool,
        profile_id: DbId,
        counterpart_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET read_at = NOW()
             WHERE recipient_id = $1 AND sender_id = $2 AND read_at IS NULL",
        )
        .bind(profile_id)
        .bind(counterpart_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
