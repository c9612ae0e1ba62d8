use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::auth_service::AuthenticatedUser;
use super::content_updater::{ContentUpdater, UpdateRequest};
use super::knowledge_search::{KnowledgeSearch, RelevantContent};
use crate::application::ports::language_model::{ToolCall, ToolDefinition};

pub const GET_INFORMATION: &str = "getInformation";
pub const UPDATE_INFORMATION: &str = "updateInformation";

const PERMISSION_DENIED: &str = "Permission denied: Only administrators can update information";

/// Failure payload returned to the model in place of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolFailure {
    success: bool,
    pub message: String,
    error: bool,
}

impl ToolFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RetrievalOutcome {
    Found(Vec<RelevantContent>),
    Failed(ToolFailure),
}

#[derive(Debug, Deserialize)]
struct GetInformationArgs {
    question: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateInformationArgs {
    search_query: String,
    new_content: String,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeTool {
    GetInformation { question: String },
    UpdateInformation(UpdateRequest),
}

impl KnowledgeTool {
    pub fn parse(call: &ToolCall) -> Result<Self, String> {
        match call.name.as_str() {
            GET_INFORMATION => {
                let args: GetInformationArgs = serde_json::from_value(call.arguments.clone())
                    .map_err(|e| format!("Invalid arguments for {}: {}", GET_INFORMATION, e))?;
                Ok(KnowledgeTool::GetInformation {
                    question: args.question,
                })
            }
            UPDATE_INFORMATION => {
                let args: UpdateInformationArgs = serde_json::from_value(call.arguments.clone())
                    .map_err(|e| format!("Invalid arguments for {}: {}", UPDATE_INFORMATION, e))?;
                Ok(KnowledgeTool::UpdateInformation(UpdateRequest {
                    search_query: args.search_query,
                    new_content: args.new_content,
                    context: args.context,
                }))
            }
            other => Err(format!("Unknown tool: {}", other)),
        }
    }
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GET_INFORMATION.to_string(),
            description: "Search the knowledge base for specific information. Use this tool when you need to find exact content for updates.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "the users question"}
                },
                "required": ["question"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: UPDATE_INFORMATION.to_string(),
            description: "Update existing information in the knowledge base when content changes.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "searchQuery": {"type": "string", "description": "The old content to find and update"},
                    "newContent": {"type": "string", "description": "The new content to replace it with"},
                    "context": {"type": "string", "description": "Surrounding text to ensure correct match"}
                },
                "required": ["searchQuery", "newContent"],
                "additionalProperties": false
            }),
        },
    ]
}

/// Runs tool calls on behalf of one user. Results are always JSON data; no
/// failure escapes as an error.
pub struct KnowledgeTools {
    search: Arc<KnowledgeSearch>,
    updater: Arc<ContentUpdater>,
}

impl KnowledgeTools {
    pub fn new(search: Arc<KnowledgeSearch>, updater: Arc<ContentUpdater>) -> Self {
        Self { search, updater }
    }

    pub async fn execute(&self, call: &ToolCall, user: &AuthenticatedUser) -> Value {
        tracing::info!("{} tool called with: {}", call.name, call.arguments);

        let result = match KnowledgeTool::parse(call) {
            Ok(KnowledgeTool::GetInformation { question }) => {
                let outcome = match self.search.find_relevant_content(&question).await {
                    Ok(found) => RetrievalOutcome::Found(found),
                    Err(e) => {
                        tracing::error!("Knowledge base search failed: {}", e);
                        RetrievalOutcome::Failed(ToolFailure::new(e.to_string()))
                    }
                };
                to_json(&outcome)
            }
            Ok(KnowledgeTool::UpdateInformation(request)) => {
                if user.is_admin() {
                    to_json(&self.updater.update(&request).await)
                } else {
                    tracing::warn!("Non-admin {} attempted an update", user.email);
                    to_json(&ToolFailure::new(PERMISSION_DENIED))
                }
            }
            Err(message) => to_json(&ToolFailure::new(message)),
        };

        tracing::info!("{} tool result: {}", call.name, result);
        result
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| json!({"success": false, "message": e.to_string(), "error": true}))
}
