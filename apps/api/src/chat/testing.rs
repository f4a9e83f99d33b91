//! In-memory doubles for the chat service's collaborators.
//! Every double appends to a shared event log so tests can assert call order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::chat::executor::{QueryExecutor, ResultRow};
use crate::chat::schema::SchemaSource;
use crate::chat::service::ChatService;
use crate::chat::store::ChatStore;
use crate::errors::AppError;
use crate::llm_client::{ChatModel, LlmError};
use crate::models::chat::{ChatMessage, NewChatMessage};
use crate::state::AppState;

pub const TEST_PERSONA: &str = "Answer like a sales analyst.";

type EventLog = Arc<Mutex<Vec<String>>>;

pub fn customer_row(name: &str, total: f64) -> ResultRow {
    let mut row = ResultRow::new();
    row.insert("customer_name".to_string(), json!(name));
    row.insert("total_order_amount".to_string(), json!(total));
    row
}

pub struct MemoryStore {
    messages: Mutex<Vec<ChatMessage>>,
    unavailable: AtomicBool,
    events: EventLog,
}

impl MemoryStore {
    fn new(events: EventLog) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
            events,
        }
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn ordered(&self) -> Vec<ChatMessage> {
        let mut messages = self.snapshot();
        messages.sort_by_key(|m| (m.timestamp, m.id));
        messages
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn insert(&self, message: NewChatMessage) -> Result<ChatMessage, AppError> {
        self.check()?;
        let role = if message.is_user { "user" } else { "assistant" };
        self.events
            .lock()
            .unwrap()
            .push(format!("store:{role}:{}", message.content));

        let mut messages = self.messages.lock().unwrap();
        let stored = ChatMessage {
            id: messages.len() as i32 + 1,
            content: message.content,
            timestamp: Utc::now(),
            is_user: message.is_user,
            query_info: message.query_info,
        };
        messages.push(stored.clone());
        Ok(stored)
    }

    async fn history(&self) -> Result<Vec<ChatMessage>, AppError> {
        self.check()?;
        Ok(self.ordered())
    }

    async fn latest_answer_with_query_info(&self) -> Result<Option<ChatMessage>, AppError> {
        self.check()?;
        Ok(self
            .ordered()
            .into_iter()
            .rev()
            .find(|m| !m.is_user && m.query_info.is_some()))
    }

    async fn latest_question_before(
        &self,
        answer: &ChatMessage,
    ) -> Result<Option<ChatMessage>, AppError> {
        self.check()?;
        Ok(self
            .ordered()
            .into_iter()
            .rev()
            .find(|m| m.is_user && (m.timestamp, m.id) < (answer.timestamp, answer.id)))
    }

    async fn clear(&self) -> Result<u64, AppError> {
        self.check()?;
        let mut messages = self.messages.lock().unwrap();
        let removed = messages.len() as u64;
        messages.clear();
        Ok(removed)
    }
}

pub enum ModelReply {
    Text(String),
    Fail,
}

pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelReply>>,
    prompts: Mutex<Vec<String>>,
    ready: AtomicBool,
    events: EventLog,
}

impl ScriptedModel {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn ensure_ready(&self) -> Result<(), LlmError> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LlmError::MissingApiKey)
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.events.lock().unwrap().push("model:complete".to_string());
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(ModelReply::Text(text)) => Ok(text),
            Some(ModelReply::Fail) => Err(LlmError::Api {
                status: 529,
                message: "overloaded".to_string(),
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}

pub struct FakeExecutor {
    outcome: Mutex<Result<Vec<ResultRow>, String>>,
    executed: Mutex<Vec<String>>,
    events: EventLog,
}

impl FakeExecutor {
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for FakeExecutor {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<ResultRow>, sqlx::Error> {
        self.events.lock().unwrap().push("executor:fetch_rows".to_string());
        self.executed.lock().unwrap().push(sql.to_string());
        self.outcome
            .lock()
            .unwrap()
            .clone()
            .map_err(sqlx::Error::Protocol)
    }
}

/// Wires the doubles together around a temporary schema document.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub executor: Arc<FakeExecutor>,
    pub model: Arc<ScriptedModel>,
    events: EventLog,
    schema: SchemaSource,
    schema_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        let events: EventLog = Arc::new(Mutex::new(Vec::new()));

        let schema_dir = tempfile::tempdir().unwrap();
        let schema_path = schema_dir.path().join("schema.json");
        let schema_doc: Value = json!({
            "table": "customer_data",
            "columns": [
                {"name": "customer_name", "type": "text"},
                {"name": "total_order_amount", "type": "float"}
            ]
        });
        std::fs::write(&schema_path, schema_doc.to_string()).unwrap();

        Self {
            store: Arc::new(MemoryStore::new(events.clone())),
            executor: Arc::new(FakeExecutor {
                outcome: Mutex::new(Ok(Vec::new())),
                executed: Mutex::new(Vec::new()),
                events: events.clone(),
            }),
            model: Arc::new(ScriptedModel {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
                ready: AtomicBool::new(true),
                events: events.clone(),
            }),
            events,
            schema: SchemaSource::new(schema_path),
            schema_dir,
        }
    }

    pub fn with_rows(self, rows: Vec<ResultRow>) -> Self {
        *self.executor.outcome.lock().unwrap() = Ok(rows);
        self
    }

    pub fn with_query_error(self, message: &str) -> Self {
        *self.executor.outcome.lock().unwrap() = Err(message.to_string());
        self
    }

    pub fn without_credential(self) -> Self {
        self.model.ready.store(false, Ordering::SeqCst);
        self
    }

    pub fn with_missing_schema(mut self) -> Self {
        self.schema = SchemaSource::new(self.schema_dir.path().join("missing.json"));
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn service(&self) -> ChatService {
        ChatService::new(
            self.store.clone(),
            self.executor.clone(),
            self.model.clone(),
            self.schema.clone(),
            TEST_PERSONA.to_string(),
        )
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            chat: Arc::new(self.service()),
            store: self.store.clone(),
        }
    }
}
