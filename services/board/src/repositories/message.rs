//! PostgreSQL message repository

use anyhow::Result;
use async_trait::async_trait;
use common::database::SharedPool;
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use super::MessageStore;
use crate::models::{BOARD_PAGE_SIZE, MessageScope, MessageView, NewMessage};

/// Message repository
#[derive(Clone)]
pub struct MessageRepository {
    pool: SharedPool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SharedPool) -> Self {
        Self { pool }
    }
}

fn message_from_row(row: PgRow) -> MessageView {
    MessageView {
        id: row.get("id"),
        body: row.get("body"),
        author_id: row.get("author_id"),
        author_email: row.get("author_email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn insert(&self, new_message: &NewMessage) -> Result<MessageView> {
        let pool = self.pool.get().await?;
        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO messages (id, author_id, body)
                VALUES ($1, $2, $3)
                RETURNING id, author_id, body, created_at, updated_at
            )
            SELECT i.id, i.body, i.author_id, a.email AS author_email,
                   i.created_at, i.updated_at
            FROM inserted i
            JOIN accounts a ON a.id = i.author_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_message.author_id)
        .bind(&new_message.body)
        .fetch_one(&pool)
        .await?;

        Ok(message_from_row(row))
    }

    async fn list(&self, scope: MessageScope) -> Result<Vec<MessageView>> {
        let pool = self.pool.get().await?;
        let rows = match scope {
            MessageScope::Board => {
                sqlx::query(
                    r#"
                    SELECT m.id, m.body, m.author_id, a.email AS author_email,
                           m.created_at, m.updated_at
                    FROM messages m
                    JOIN accounts a ON a.id = m.author_id
                    ORDER BY m.created_at DESC
                    LIMIT $1
                    "#,
                )
                .bind(BOARD_PAGE_SIZE as i64)
                .fetch_all(&pool)
                .await?
            }
            MessageScope::Author(author_id) => {
                sqlx::query(
                    r#"
                    SELECT m.id, m.body, m.author_id, a.email AS author_email,
                           m.created_at, m.updated_at
                    FROM messages m
                    JOIN accounts a ON a.id = m.author_id
                    WHERE m.author_id = $1
                    ORDER BY m.created_at DESC
                    "#,
                )
                .bind(author_id)
                .fetch_all(&pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(message_from_row).collect())
    }
}
