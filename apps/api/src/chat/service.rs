//! Chat orchestration: question → SQL → rows → narrated answer, plus follow-ups
//! answered from the previously stored result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::chat::executor::QueryExecutor;
use crate::chat::prompts::{
    render_follow_up, render_query_info, render_sql_generation, render_summary, PriorExchange,
};
use crate::chat::schema::SchemaSource;
use crate::chat::sql_extract::{extract_select_statement, SqlExtraction};
use crate::chat::store::ChatStore;
use crate::errors::AppError;
use crate::llm_client::ChatModel;
use crate::models::chat::NewChatMessage;

/// Prefix that turns a message into a follow-up. Matched case-insensitively.
pub const FOLLOW_UP_MARKER: &str = "follow up:";

/// What the caller gets back from a chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub query_info: Option<String>,
}

/// How an incoming message is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTurn<'a> {
    /// Answer from the previous query's stored result, without new SQL.
    FollowUp(&'a str),
    /// Generate and run a fresh query.
    Question(&'a str),
}

impl<'a> ChatTurn<'a> {
    /// Splits off the follow-up marker and trims the remaining question.
    pub fn classify(message: &'a str) -> Self {
        match message.get(..FOLLOW_UP_MARKER.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(FOLLOW_UP_MARKER) => {
                ChatTurn::FollowUp(message[FOLLOW_UP_MARKER.len()..].trim())
            }
            _ => ChatTurn::Question(message),
        }
    }
}

pub struct ChatService {
    store: Arc<dyn ChatStore>,
    executor: Arc<dyn QueryExecutor>,
    model: Arc<dyn ChatModel>,
    schema: SchemaSource,
    persona: String,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ChatStore>,
        executor: Arc<dyn QueryExecutor>,
        model: Arc<dyn ChatModel>,
        schema: SchemaSource,
        persona: String,
    ) -> Self {
        Self {
            store,
            executor,
            model,
            schema,
            persona,
        }
    }

    /// Answers one user message and records the exchange.
    pub async fn handle(&self, message: &str) -> Result<ChatReply, AppError> {
        self.model.ensure_ready()?;
        if message.is_empty() {
            return Err(AppError::Validation("No message provided".to_string()));
        }

        info!("Received message: {message}");

        match ChatTurn::classify(message) {
            ChatTurn::FollowUp(question) => self.answer_follow_up(question).await,
            ChatTurn::Question(question) => self.answer_question(question).await,
        }
    }

    async fn answer_follow_up(&self, question: &str) -> Result<ChatReply, AppError> {
        let answer = self.store.latest_answer_with_query_info().await?;
        let asked = match &answer {
            Some(answer) => self.store.latest_question_before(answer).await?,
            None => None,
        };

        let prior = match (&answer, &asked) {
            (Some(answer), Some(asked)) => answer.query_info.as_deref().map(|query_info| PriorExchange {
                question: &asked.content,
                response: &answer.content,
                query_info,
            }),
            _ => None,
        };
        if prior.is_none() {
            debug!("No previous query to ground the follow-up on");
        }
        let prompt = render_follow_up(prior, question, &self.persona);

        self.store.insert(NewChatMessage::user(question)).await?;

        let reply = self.model.complete(&prompt).await?;
        let query_info = answer.and_then(|a| a.query_info);

        self.store
            .insert(NewChatMessage::assistant(reply.as_str(), query_info.clone()))
            .await?;

        Ok(ChatReply {
            response: reply,
            query_info,
        })
    }

    async fn answer_question(&self, question: &str) -> Result<ChatReply, AppError> {
        let schema_json = self.schema.load_pretty().await?;
        let prompt = render_sql_generation(&schema_json, question);

        self.store.insert(NewChatMessage::user(question)).await?;

        let reply = self.model.complete(&prompt).await?;
        debug!("SQL generation reply: {reply}");

        let sql = match extract_select_statement(&reply) {
            SqlExtraction::Statement(sql) => sql,
            SqlExtraction::NoSelect => {
                debug!("Reply contains no SELECT; returning it as-is");
                return Ok(ChatReply {
                    response: reply,
                    query_info: None,
                });
            }
            SqlExtraction::Unterminated => {
                warn!("Reply mentions SELECT but has no terminating ';'; returning it as-is");
                return Ok(ChatReply {
                    response: reply,
                    query_info: None,
                });
            }
        };

        let rows = match self.executor.fetch_rows(sql).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Error executing query `{sql}`: {e}");
                return Ok(ChatReply {
                    response: format!("{reply}\n\nError executing query: {e}"),
                    query_info: None,
                });
            }
        };

        let results_json = serde_json::to_string_pretty(&rows).map_err(anyhow::Error::from)?;
        let summary = self
            .model
            .complete(&render_summary(question, &results_json, &self.persona))
            .await?;
        let query_info = render_query_info(&results_json, sql);

        self.store
            .insert(NewChatMessage::assistant(summary.as_str(), Some(query_info.clone())))
            .await?;

        Ok(ChatReply {
            response: summary,
            query_info: Some(query_info),
        })
    }
}
