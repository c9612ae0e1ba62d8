use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        result: Value,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    #[serde(deserialize_with = "deserialize_content")]
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: Vec<ContentPart>) -> Self {
        Self { role, content }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, vec![ContentPart::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, vec![ContentPart::text(text)])
    }

    /// Text parts joined with newlines; tool parts are skipped.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// Clients send either a plain string or a list of typed parts.
fn deserialize_content<'de, D>(deserializer: D) -> Result<Vec<ContentPart>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawContent {
        Text(String),
        Parts(Vec<ContentPart>),
    }

    Ok(match RawContent::deserialize(deserializer)? {
        RawContent::Text(text) => vec![ContentPart::Text { text }],
        RawContent::Parts(parts) => parts,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_content_becomes_single_text_part() {
        let message: ChatMessage =
            serde_json::from_value(json!({"role": "user", "content": "hi there"})).unwrap();

        assert_eq!(message.role, MessageRole::User);
        assert_eq!(message.content, vec![ContentPart::text("hi there")]);
    }

    #[test]
    fn test_parts_content_is_kept() {
        let message: ChatMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": [
                {"type": "text", "text": "looking"},
                {"type": "tool-call", "toolCallId": "c1", "toolName": "getInformation", "args": {"question": "q"}}
            ]
        }))
        .unwrap();

        assert_eq!(message.content.len(), 2);
        assert_eq!(message.text(), "looking");
        assert!(matches!(
            &message.content[1],
            ContentPart::ToolCall { tool_name, .. } if tool_name == "getInformation"
        ));
    }

    #[test]
    fn test_text_joins_text_parts_only() {
        let message = ChatMessage::new(
            MessageRole::User,
            vec![
                ContentPart::text("first"),
                ContentPart::ToolResult {
                    tool_call_id: "c".to_string(),
                    tool_name: "t".to_string(),
                    result: json!(null),
                },
                ContentPart::text("second"),
            ],
        );
        assert_eq!(message.text(), "first\nsecond");
    }
}
