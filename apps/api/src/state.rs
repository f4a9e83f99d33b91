use std::sync::Arc;

use crate::chat::service::ChatService;
use crate::chat::store::ChatStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    /// Direct handle on the message log for history and reset.
    pub store: Arc<dyn ChatStore>,
}
