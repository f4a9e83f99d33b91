//! Chat message log. Append-only apart from the wholesale reset.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::chat::{ChatMessage, NewChatMessage};

/// Persistence for chat turns. `PgChatStore` in production, in-memory in tests.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Writes one turn and returns it with its assigned id and timestamp.
    async fn insert(&self, message: NewChatMessage) -> Result<ChatMessage, AppError>;

    /// Every turn, oldest first.
    async fn history(&self) -> Result<Vec<ChatMessage>, AppError>;

    /// Most recent assistant turn that carries `query_info`.
    async fn latest_answer_with_query_info(&self) -> Result<Option<ChatMessage>, AppError>;

    /// Most recent user turn written before `answer`.
    async fn latest_question_before(
        &self,
        answer: &ChatMessage,
    ) -> Result<Option<ChatMessage>, AppError>;

    /// Deletes every turn. Returns the number of rows removed.
    async fn clear(&self) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn insert(&self, message: NewChatMessage) -> Result<ChatMessage, AppError> {
        let row = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO chat_message (content, is_user, query_info)
            VALUES ($1, $2, $3)
            RETURNING id, content, timestamp, is_user, query_info
            "#,
        )
        .bind(&message.content)
        .bind(message.is_user)
        .bind(&message.query_info)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn history(&self) -> Result<Vec<ChatMessage>, AppError> {
        Ok(sqlx::query_as::<_, ChatMessage>(
            "SELECT id, content, timestamp, is_user, query_info FROM chat_message ORDER BY timestamp ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn latest_answer_with_query_info(&self) -> Result<Option<ChatMessage>, AppError> {
        Ok(sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, content, timestamp, is_user, query_info
            FROM chat_message
            WHERE NOT is_user AND query_info IS NOT NULL
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn latest_question_before(
        &self,
        answer: &ChatMessage,
    ) -> Result<Option<ChatMessage>, AppError> {
        Ok(sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, content, timestamp, is_user, query_info
            FROM chat_message
            WHERE is_user AND (timestamp, id) < ($1::timestamptz, $2::int4)
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(answer.timestamp)
        .bind(answer.id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn clear(&self) -> Result<u64, AppError> {
        // Dropping the transaction on an error path rolls it back.
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM chat_message")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        info!("Chat history cleared ({deleted} messages)");
        Ok(deleted)
    }
}
