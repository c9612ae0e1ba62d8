use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::mpsc;

use super::auth_service::AuthenticatedUser;
use super::hyde_retriever::{HydeError, HydeRetriever};
use super::tools::{KnowledgeTools, tool_definitions};
use crate::application::ports::LanguageModel;
use crate::application::ports::language_model::{CompletionRequest, LanguageModelError};
use crate::domain::entities::{Chat, ChatMessage, ContentPart, MessageRole};
use crate::domain::repositories::{ChatRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Chat {0} belongs to another user")]
    Forbidden(String),
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] HydeError),
    #[error("Language model error: {0}")]
    LanguageModel(#[from] LanguageModelError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    /// `None` when the client sent no selection; retrieval is skipped then.
    pub selected_file_pathnames: Option<Vec<String>>,
}

/// What the client sees while a turn runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChatEvent {
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
    Error {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Finish {
        finish_reason: String,
        steps: usize,
    },
}

impl ChatEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::Text { .. } => "text",
            ChatEvent::ToolCall { .. } => "tool-call",
            ChatEvent::ToolResult { .. } => "tool-result",
            ChatEvent::Error { .. } => "error",
            ChatEvent::Finish { .. } => "finish",
        }
    }
}

pub fn system_prompt(is_admin: bool) -> String {
    let update_rules = if is_admin {
        "\
   - First use getInformation to find the exact content to update
   - BEFORE making any changes, show the user:
     * The exact content that will be updated (copy and paste the exact text)
     * The proposed new content (copy and paste the exact text with changes)
     * Ask for explicit confirmation to proceed with \"Do you want me to update this information?\"
   - ONLY after receiving confirmation, use updateInformation tool with:
     * searchQuery: The EXACT existing text that needs to be updated (copy the full line or paragraph)
     * newContent: The EXACT new text to replace it with (the full line or paragraph with changes)
     * context: (Optional) Some surrounding text to ensure accurate matching
   - If the update is successful (success: true in response), inform the user
   - Do not verify again unless the user specifically asks"
    } else {
        "\
   - Politely inform the user that only administrators can make updates to the knowledge base
   - Offer to show them the information they're interested in using the getInformation tool
   - Suggest they contact an administrator if they need to make changes"
    };

    format!(
        "you are a friendly assistant! keep your responses concise and helpful.

1. For general questions about code or files, I'll automatically provide relevant context.

2. For specific information retrieval needs, use the getInformation tool.

3. IMPORTANT: When a user asks to update, change, modify, or edit any information:
{}

4. EXAMPLES of update requests:
   - \"Update the morning shift to start at 9:00 AM\"
   - \"Change Team A's hours to 9-5\"
   - \"Modify the schedule for morning shift\"
   - \"Edit the morning shift time\"",
        update_rules
    )
}

pub struct ChatService {
    language_model: Arc<dyn LanguageModel>,
    retriever: Arc<HydeRetriever>,
    tools: Arc<KnowledgeTools>,
    chat_repository: Arc<dyn ChatRepository>,
    max_steps: usize,
}

impl ChatService {
    pub fn new(
        language_model: Arc<dyn LanguageModel>,
        retriever: Arc<HydeRetriever>,
        tools: Arc<KnowledgeTools>,
        chat_repository: Arc<dyn ChatRepository>,
        max_steps: usize,
    ) -> Self {
        Self {
            language_model,
            retriever,
            tools,
            chat_repository,
            max_steps,
        }
    }

    /// Rejects malformed requests and chats written by someone else. Returns
    /// the stored chat when this is a follow-up turn.
    pub async fn check_request(
        &self,
        user: &AuthenticatedUser,
        request: &ChatRequest,
    ) -> Result<Option<Chat>, ChatError> {
        if request.id.trim().is_empty() {
            return Err(ChatError::InvalidRequest("chat id is required".to_string()));
        }
        if request.messages.is_empty() {
            return Err(ChatError::InvalidRequest("messages cannot be empty".to_string()));
        }

        let existing = self.chat_repository.find_by_id(&request.id).await?;
        if let Some(chat) = &existing {
            if chat.author != user.email {
                return Err(ChatError::Forbidden(request.id.clone()));
            }
        }
        Ok(existing)
    }

    /// Runs one chat turn, streaming progress into `events`, and persists the
    /// conversation once the model is done. A closed receiver does not stop the
    /// turn.
    pub async fn run_turn(
        &self,
        user: &AuthenticatedUser,
        request: ChatRequest,
        events: mpsc::Sender<ChatEvent>,
    ) -> Result<Chat, ChatError> {
        let existing = self.check_request(user, &request).await?;
        self.run_checked_turn(user, request, existing, events).await
    }

    /// Same as [`ChatService::run_turn`] for a request that already passed
    /// [`ChatService::check_request`]; `existing` is what that check returned.
    pub async fn run_checked_turn(
        &self,
        user: &AuthenticatedUser,
        request: ChatRequest,
        existing: Option<Chat>,
        events: mpsc::Sender<ChatEvent>,
    ) -> Result<Chat, ChatError> {
        let provider_metadata = json!({
            "files": { "selection": request.selected_file_pathnames }
        });
        let mut conversation = self
            .retriever
            .transform(Some(user), &provider_metadata, request.messages.clone())
            .await?;

        let system = system_prompt(user.is_admin());
        let tools = tool_definitions();
        let mut assistant_text = String::new();
        let mut steps = 0;
        let mut finish_reason = "length".to_string();

        while steps < self.max_steps {
            steps += 1;
            let response = self
                .language_model
                .complete(CompletionRequest {
                    system: Some(system.clone()),
                    messages: conversation.clone(),
                    tools: tools.clone(),
                })
                .await?;

            if !response.text.is_empty() {
                assistant_text.push_str(&response.text);
                emit(
                    &events,
                    ChatEvent::Text {
                        text: response.text.clone(),
                    },
                )
                .await;
            }

            if response.tool_calls.is_empty() {
                finish_reason = response.finish_reason.unwrap_or_else(|| "stop".to_string());
                break;
            }

            let mut assistant_parts = Vec::new();
            if !response.text.is_empty() {
                assistant_parts.push(ContentPart::text(response.text.clone()));
            }
            let mut result_parts = Vec::new();

            for call in &response.tool_calls {
                emit(
                    &events,
                    ChatEvent::ToolCall {
                        tool_call_id: call.id.clone(),
                        tool_name: call.name.clone(),
                        args: call.arguments.clone(),
                    },
                )
                .await;

                let result = self.tools.execute(call, user).await;

                emit(
                    &events,
                    ChatEvent::ToolResult {
                        tool_call_id: call.id.clone(),
                        tool_name: call.name.clone(),
                        result: result.clone(),
                    },
                )
                .await;

                assistant_parts.push(ContentPart::ToolCall {
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    args: call.arguments.clone(),
                });
                result_parts.push(ContentPart::ToolResult {
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    result,
                });
            }

            conversation.push(ChatMessage::new(MessageRole::Assistant, assistant_parts));
            conversation.push(ChatMessage::new(MessageRole::Tool, result_parts));
        }

        if finish_reason == "length" {
            tracing::warn!("Chat {} stopped after {} steps", request.id, steps);
        }

        let mut messages = request.messages;
        messages.push(ChatMessage::assistant(assistant_text));
        let chat = Chat {
            id: request.id,
            created_at: existing.map(|c| c.created_at).unwrap_or_else(Utc::now),
            messages,
            author: user.email.clone(),
        };
        self.chat_repository.save(&chat).await?;

        emit(
            &events,
            ChatEvent::Finish {
                finish_reason,
                steps,
            },
        )
        .await;

        tracing::info!("Chat {} saved after {} step(s)", chat.id, steps);
        Ok(chat)
    }
}

async fn emit(events: &mpsc::Sender<ChatEvent>, event: ChatEvent) {
    if events.send(event).await.is_err() {
        tracing::debug!("Chat event receiver dropped");
    }
}
