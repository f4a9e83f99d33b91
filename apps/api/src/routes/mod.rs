pub mod health;
pub mod ui;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health::health_handler))
        .route("/chat", post(handlers::handle_chat))
        .route("/history", get(handlers::handle_history))
        .route(
            "/reset",
            get(handlers::handle_reset).post(handlers::handle_reset),
        )
        .with_state(state)
}
