use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::entities::ChatMessage;

#[derive(Debug, Error)]
pub enum LanguageModelError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// One step of the main chat model, with tool access.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LanguageModelError>;

    /// Free text from the utility model.
    async fn generate_text(&self, system: &str, prompt: &str)
    -> Result<String, LanguageModelError>;

    /// Picks exactly one of `labels` using the utility model.
    async fn classify(
        &self,
        system: &str,
        prompt: &str,
        labels: &[&str],
    ) -> Result<String, LanguageModelError>;
}
