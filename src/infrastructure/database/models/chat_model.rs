use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::domain::entities::{Chat, ChatMessage};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::schema::chats;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = chats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatModel {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Value,
    pub author: String,
}

impl TryFrom<&Chat> for ChatModel {
    type Error = RepositoryError;

    fn try_from(chat: &Chat) -> Result<Self, Self::Error> {
        let messages = serde_json::to_value(&chat.messages)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        Ok(Self {
            id: chat.id.clone(),
            created_at: chat.created_at,
            messages,
            author: chat.author.clone(),
        })
    }
}

impl TryFrom<ChatModel> for Chat {
    type Error = RepositoryError;

    fn try_from(model: ChatModel) -> Result<Self, Self::Error> {
        let messages: Vec<ChatMessage> = serde_json::from_value(model.messages)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        Ok(Chat {
            id: model.id,
            created_at: model.created_at,
            messages,
            author: model.author,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ContentPart, MessageRole};
    use serde_json::json;

    #[test]
    fn test_messages_survive_jsonb_column() {
        let chat = Chat {
            id: "chat-1".to_string(),
            created_at: Utc::now(),
            messages: vec![
                ChatMessage::user("when does my shift start?"),
                ChatMessage::new(
                    MessageRole::Assistant,
                    vec![
                        ContentPart::text("Checking"),
                        ContentPart::ToolCall {
                            tool_call_id: "c1".to_string(),
                            tool_name: "getInformation".to_string(),
                            args: json!({"question": "shift start"}),
                        },
                    ],
                ),
            ],
            author: "ann@x.io".to_string(),
        };

        let model = ChatModel::try_from(&chat).unwrap();
        assert_eq!(model.messages[0]["content"][0]["type"], "text");

        assert_eq!(Chat::try_from(model).unwrap(), chat);
    }
}
