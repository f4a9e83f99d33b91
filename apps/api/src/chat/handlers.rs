//! Axum route handlers for the chat API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chat::service::ChatReply;
use crate::errors::AppError;
use crate::models::chat::ChatMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
}

/// POST /chat
pub async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let reply = state.chat.handle(&request.message).await?;
    Ok(Json(reply))
}

/// GET /history
///
/// Never fails: a store error is logged and an empty list returned so the UI keeps working.
pub async fn handle_history(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    match state.store.history().await {
        Ok(messages) => {
            info!("Returning history with {} messages", messages.len());
            Json(messages)
        }
        Err(e) => {
            error!("Error fetching history: {e}");
            Json(Vec::new())
        }
    }
}

/// GET|POST /reset
pub async fn handle_reset(State(state): State<AppState>) -> Result<Json<ResetResponse>, AppError> {
    state.store.clear().await?;
    Ok(Json(ResetResponse {
        message: "Chat history cleared successfully".to_string(),
    }))
}
