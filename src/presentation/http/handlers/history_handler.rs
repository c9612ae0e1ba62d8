use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::application::services::AuthService;
use crate::application::use_cases::ChatHistoryUseCase;
use crate::presentation::http::auth::{CurrentUser, SessionAuth};
use crate::presentation::http::dto::{ApiResponse, ChatSummaryDto, error_response};

pub struct HistoryHandler {
    chat_history_use_case: Arc<ChatHistoryUseCase>,
    auth_service: Arc<AuthService>,
}

impl SessionAuth for HistoryHandler {
    fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
}

impl HistoryHandler {
    pub fn new(chat_history_use_case: Arc<ChatHistoryUseCase>, auth_service: Arc<AuthService>) -> Self {
        Self {
            chat_history_use_case,
            auth_service,
        }
    }

    pub async fn list_chats(
        State(handler): State<Arc<HistoryHandler>>,
        current: CurrentUser,
    ) -> Response {
        match handler.chat_history_use_case.list(&current.user.email).await {
            Ok(chats) => {
                let summaries: Vec<ChatSummaryDto> =
                    chats.into_iter().map(ChatSummaryDto::from).collect();
                (StatusCode::OK, Json(ApiResponse::success(summaries))).into_response()
            }
            Err(e) => {
                tracing::error!("Loading history for {} failed: {}", current.user.email, e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "HISTORY_FAILED", e.to_string())
            }
        }
    }

    pub async fn get_chat(
        State(handler): State<Arc<HistoryHandler>>,
        current: CurrentUser,
        Path(chat_id): Path<String>,
    ) -> Response {
        match handler
            .chat_history_use_case
            .get(&chat_id, &current.user.email)
            .await
        {
            Ok(Some(chat)) => (StatusCode::OK, Json(ApiResponse::success(chat))).into_response(),
            Ok(None) => error_response(
                StatusCode::NOT_FOUND,
                "CHAT_NOT_FOUND",
                format!("Chat {} not found", chat_id),
            ),
            Err(e) => {
                tracing::error!("Loading chat {} failed: {}", chat_id, e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "HISTORY_FAILED", e.to_string())
            }
        }
    }
}
