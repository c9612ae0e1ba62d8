use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
    EmbeddingRequest, EmbeddingResponse,
};
use crate::application::ports::language_model::{
    CompletionRequest, CompletionResponse, LanguageModel, LanguageModelError, ToolCall,
};
use crate::domain::entities::{ChatMessage, ContentPart, MessageRole};

#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug)]
pub enum OpenAiError {
    RequestError(String),
    RateLimited,
    Status { status: u16, body: String },
    ParseError(String),
}

impl std::fmt::Display for OpenAiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenAiError::RequestError(msg) => write!(f, "request failed: {}", msg),
            OpenAiError::RateLimited => write!(f, "rate limited"),
            OpenAiError::Status { status, body } => write!(f, "status {}: {}", status, body),
            OpenAiError::ParseError(msg) => write!(f, "unexpected response: {}", msg),
        }
    }
}

/// Thin JSON-over-HTTP client for an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiClientConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T, OpenAiError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| OpenAiError::RequestError(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(OpenAiError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| OpenAiError::ParseError(e.to_string()))
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
    model: String,
    usage: Option<EmbeddingUsage>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingUsage {
    total_tokens: i32,
}

impl From<OpenAiError> for EmbeddingProviderError {
    fn from(e: OpenAiError) -> Self {
        match e {
            OpenAiError::RequestError(msg) => EmbeddingProviderError::NetworkError(msg),
            OpenAiError::RateLimited => EmbeddingProviderError::RateLimitExceeded,
            other => EmbeddingProviderError::ApiError(other.to_string()),
        }
    }
}

pub struct OpenAiEmbeddingProvider {
    client: OpenAiClient,
    model: String,
    dimension: usize,
}

impl OpenAiEmbeddingProvider {
    pub fn new(client: OpenAiClient, model: String, dimension: usize) -> Self {
        Self {
            client,
            model,
            dimension,
        }
    }

    async fn embed(
        &self,
        input: Value,
        expected: usize,
    ) -> Result<(Vec<Vector>, String, Option<i32>), EmbeddingProviderError> {
        let mut response: EmbeddingsResponse = self
            .client
            .post("embeddings", &json!({ "model": self.model, "input": input }))
            .await?;

        if response.data.len() != expected {
            return Err(EmbeddingProviderError::ApiError(format!(
                "Expected {} embeddings, got {}",
                expected,
                response.data.len()
            )));
        }

        response.data.sort_by_key(|d| d.index);
        if let Some(bad) = response.data.iter().find(|d| d.embedding.len() != self.dimension) {
            return Err(EmbeddingProviderError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.embedding.len(),
            });
        }

        let embeddings = response
            .data
            .into_iter()
            .map(|d| Vector::from(d.embedding))
            .collect();
        let tokens = response.usage.map(|u| u.total_tokens);

        Ok((embeddings, response.model, tokens))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        let (mut embeddings, model_name, token_count) =
            self.embed(Value::String(request.text), 1).await?;

        let embedding = embeddings
            .pop()
            .ok_or_else(|| EmbeddingProviderError::ApiError("No embeddings returned".to_string()))?;

        Ok(EmbeddingResponse {
            embedding,
            model_name,
            token_count,
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        if request.texts.is_empty() {
            return Ok(BatchEmbeddingResponse {
                embeddings: Vec::new(),
                model_name: self.model.clone(),
                total_tokens: None,
            });
        }

        let expected = request.texts.len();
        let (embeddings, model_name, total_tokens) =
            self.embed(json!(request.texts), expected).await?;

        Ok(BatchEmbeddingResponse {
            embeddings,
            model_name,
            total_tokens,
        })
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    /// JSON text, as the API sends it.
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

impl From<OpenAiError> for LanguageModelError {
    fn from(e: OpenAiError) -> Self {
        match e {
            OpenAiError::RequestError(msg) => LanguageModelError::NetworkError(msg),
            OpenAiError::RateLimited => LanguageModelError::RateLimitExceeded,
            OpenAiError::ParseError(msg) => LanguageModelError::InvalidResponse(msg),
            other => LanguageModelError::ApiError(other.to_string()),
        }
    }
}

/// Converts conversation messages to the chat-completions wire format. A tool
/// message carrying several results becomes one wire message per result.
fn wire_messages(system: Option<&str>, messages: &[ChatMessage]) -> Vec<Value> {
    let mut wire = Vec::new();

    if let Some(system) = system {
        wire.push(json!({ "role": "system", "content": system }));
    }

    for message in messages {
        match message.role {
            MessageRole::System => {
                wire.push(json!({ "role": "system", "content": message.text() }));
            }
            MessageRole::User => {
                wire.push(json!({ "role": "user", "content": message.text() }));
            }
            MessageRole::Assistant => {
                let tool_calls: Vec<WireToolCall> = message
                    .content
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::ToolCall {
                            tool_call_id,
                            tool_name,
                            args,
                        } => Some(WireToolCall {
                            id: tool_call_id.clone(),
                            kind: function_type(),
                            function: WireFunction {
                                name: tool_name.clone(),
                                arguments: args.to_string(),
                            },
                        }),
                        _ => None,
                    })
                    .collect();

                let text = message.text();
                let mut entry = json!({ "role": "assistant" });
                entry["content"] = if text.is_empty() { Value::Null } else { json!(text) };
                if !tool_calls.is_empty() {
                    entry["tool_calls"] = json!(tool_calls);
                }
                wire.push(entry);
            }
            MessageRole::Tool => {
                for part in &message.content {
                    if let ContentPart::ToolResult {
                        tool_call_id,
                        result,
                        ..
                    } = part
                    {
                        wire.push(json!({
                            "role": "tool",
                            "tool_call_id": tool_call_id,
                            "content": result.to_string(),
                        }));
                    }
                }
            }
        }
    }

    wire
}

pub struct OpenAiLanguageModel {
    client: OpenAiClient,
    chat_model: String,
    utility_model: String,
}

impl OpenAiLanguageModel {
    pub fn new(client: OpenAiClient, chat_model: String, utility_model: String) -> Self {
        Self {
            client,
            chat_model,
            utility_model,
        }
    }

    async fn first_choice(&self, body: Value) -> Result<Choice, LanguageModelError> {
        let response: ChatCompletionResponse = self.client.post("chat/completions", &body).await?;

        response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LanguageModelError::InvalidResponse("No choices returned".to_string()))
    }
}

#[async_trait]
impl LanguageModel for OpenAiLanguageModel {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LanguageModelError> {
        let mut body = json!({
            "model": self.chat_model,
            "messages": wire_messages(request.system.as_deref(), &request.messages),
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = json!(tools);
        }

        let choice = self.first_choice(body).await?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| {
                let arguments = serde_json::from_str(&call.function.arguments).map_err(|e| {
                    LanguageModelError::InvalidResponse(format!(
                        "Tool call {} has malformed arguments: {}",
                        call.id, e
                    ))
                })?;
                Ok(ToolCall {
                    id: call.id,
                    name: call.function.name,
                    arguments,
                })
            })
            .collect::<Result<Vec<_>, LanguageModelError>>()?;

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            tool_calls,
            finish_reason: choice.finish_reason,
        })
    }

    async fn generate_text(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, LanguageModelError> {
        let body = json!({
            "model": self.utility_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        let choice = self.first_choice(body).await?;
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn classify(
        &self,
        system: &str,
        prompt: &str,
        labels: &[&str],
    ) -> Result<String, LanguageModelError> {
        let body = json!({
            "model": self.utility_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "classification",
                    "strict": true,
                    "schema": {
                        "type": "object",
                        "properties": { "label": { "type": "string", "enum": labels } },
                        "required": ["label"],
                        "additionalProperties": false,
                    },
                },
            },
        });

        let choice = self.first_choice(body).await?;
        let content = choice.message.content.unwrap_or_default();

        #[derive(Deserialize)]
        struct Classification {
            label: String,
        }

        let parsed: Classification = serde_json::from_str(&content)
            .map_err(|e| LanguageModelError::InvalidResponse(format!("{}: {}", e, content)))?;

        if !labels.contains(&parsed.label.as_str()) {
            return Err(LanguageModelError::InvalidResponse(format!(
                "Label {} is not one of {:?}",
                parsed.label, labels
            )));
        }

        Ok(parsed.label)
    }
}
