use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::{ChatHandler, HistoryHandler};

pub fn chat_routes(chat_handler: Arc<ChatHandler>) -> Router {
    Router::new()
        .route("/api/chat", post(ChatHandler::chat))
        .with_state(chat_handler)
}

pub fn history_routes(history_handler: Arc<HistoryHandler>) -> Router {
    Router::new()
        .route("/api/history", get(HistoryHandler::list_chats))
        .route("/api/chats/{chat_id}", get(HistoryHandler::get_chat))
        .with_state(history_handler)
}
