use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::chat_service::ChatRequest;
use crate::domain::entities::{Chat, ChatMessage, MessageRole};

const TITLE_MAX_CHARS: usize = 80;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestDto {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub selected_file_pathnames: Option<Vec<String>>,
}

impl From<ChatRequestDto> for ChatRequest {
    fn from(dto: ChatRequestDto) -> Self {
        Self {
            id: dto.id,
            messages: dto.messages,
            selected_file_pathnames: dto.selected_file_pathnames,
        }
    }
}

/// One entry of the history sidebar.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummaryDto {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

impl From<Chat> for ChatSummaryDto {
    fn from(chat: Chat) -> Self {
        let title = chat
            .messages
            .iter()
            .find(|message| message.role == MessageRole::User)
            .map(|message| message.text().chars().take(TITLE_MAX_CHARS).collect())
            .unwrap_or_default();

        Self {
            id: chat.id,
            title,
            created_at: chat.created_at,
            message_count: chat.messages.len(),
        }
    }
}
