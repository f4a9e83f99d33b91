use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One persisted turn of the conversation. Rows are never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: i32,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_user: bool,
    /// SQL text and serialized result set behind an assistant answer.
    pub query_info: Option<String>,
}

/// A turn that has not been written yet; the store assigns `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChatMessage {
    pub content: String,
    pub is_user: bool,
    pub query_info: Option<String>,
}

impl NewChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: true,
            query_info: None,
        }
    }

    pub fn assistant(content: impl Into<String>, query_info: Option<String>) -> Self {
        Self {
            content: content.into(),
            is_user: false,
            query_info,
        }
    }
}
