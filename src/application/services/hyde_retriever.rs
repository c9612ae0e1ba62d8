use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::auth_service::AuthenticatedUser;
use super::embedding_service::{EmbeddingService, EmbeddingServiceError};
use super::vector_index_service::{VectorIndexError, VectorIndexService};
use crate::application::ports::LanguageModel;
use crate::application::ports::language_model::LanguageModelError;
use crate::domain::entities::{ChatMessage, ContentPart, MessageRole, RetrievedChunk};
use crate::domain::value_objects::{FilePath, cosine_similarity, rank_top_k};

const CLASSIFY_SYSTEM_PROMPT: &str = "classify the user message as a question, statement, or other";
const HYPOTHETICAL_ANSWER_SYSTEM_PROMPT: &str = "Answer the users question:";
pub const CONTEXT_HEADER: &str =
    "Here is some relevant information that you can use to answer the question:";

#[derive(Debug, Error)]
pub enum HydeError {
    #[error("Language model error: {0}")]
    LanguageModel(#[from] LanguageModelError),
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingServiceError),
    #[error("Vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Question,
    Statement,
    Other,
}

impl MessageKind {
    pub const LABELS: [&'static str; 3] = ["question", "statement", "other"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Question => "question",
            MessageKind::Statement => "statement",
            MessageKind::Other => "other",
        }
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "question" => Ok(MessageKind::Question),
            "statement" => Ok(MessageKind::Statement),
            "other" => Ok(MessageKind::Other),
            other => Err(format!("Unknown message kind: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileSelectionMetadata {
    files: SelectedFiles,
}

#[derive(Debug, Deserialize)]
struct SelectedFiles {
    selection: Vec<String>,
}

/// Hypothetical-document-embedding retrieval applied to a chat request before
/// the main model sees it.
///
/// Every chunk in the corpus is re-embedded on every question; there is no
/// embedding cache, so cost grows linearly with corpus size.
pub struct HydeRetriever {
    language_model: Arc<dyn LanguageModel>,
    embedding_service: Arc<EmbeddingService>,
    vector_index: Arc<VectorIndexService>,
    top_k: usize,
    scope_to_selection: bool,
}

impl HydeRetriever {
    pub fn new(
        language_model: Arc<dyn LanguageModel>,
        embedding_service: Arc<EmbeddingService>,
        vector_index: Arc<VectorIndexService>,
        top_k: usize,
        scope_to_selection: bool,
    ) -> Self {
        Self {
            language_model,
            embedding_service,
            vector_index,
            top_k,
            scope_to_selection,
        }
    }

    /// Returns `messages` unchanged unless the last one is a user question, in
    /// which case the best matching chunks are appended to it as text parts.
    pub async fn transform(
        &self,
        session: Option<&AuthenticatedUser>,
        provider_metadata: &Value,
        mut messages: Vec<ChatMessage>,
    ) -> Result<Vec<ChatMessage>, HydeError> {
        let Some(user) = session else {
            return Ok(messages);
        };

        let Ok(metadata) = FileSelectionMetadata::deserialize(provider_metadata) else {
            tracing::debug!("No file selection in provider metadata, skipping retrieval");
            return Ok(messages);
        };

        let Some(recent) = messages.pop() else {
            return Ok(messages);
        };
        if recent.role != MessageRole::User {
            messages.push(recent);
            return Ok(messages);
        }

        let prompt = recent.text();
        let kind = self.classify(&prompt).await?;
        tracing::debug!("Classified message as {}", kind.as_str());

        if kind != MessageKind::Question {
            messages.push(recent);
            return Ok(messages);
        }

        let hypothetical_answer = self
            .language_model
            .generate_text(HYPOTHETICAL_ANSWER_SYSTEM_PROMPT, &prompt)
            .await?;
        let answer_embedding = self.embedding_service.embed_text(&hypothetical_answer).await?;

        let candidates = self.candidate_chunks(user, &metadata.files.selection).await?;
        // Blank chunks cannot be embedded by the provider.
        let candidates: Vec<RetrievedChunk> = candidates
            .into_iter()
            .filter(|chunk| !chunk.content.trim().is_empty())
            .collect();

        if candidates.is_empty() {
            tracing::info!("No chunks available for retrieval");
            messages.push(recent);
            return Ok(messages);
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedding_service.embed_each_concurrently(&texts).await?;

        let scored = candidates
            .into_iter()
            .zip(embeddings.iter())
            .map(|(chunk, embedding)| {
                let score = cosine_similarity(answer_embedding.as_slice(), embedding.as_slice());
                (chunk, score)
            });
        let top = rank_top_k(scored, self.top_k);

        tracing::info!(
            "Appending {} retrieved chunks to the user message",
            top.len()
        );

        let mut content = recent.content;
        content.push(ContentPart::text(CONTEXT_HEADER));
        content.extend(top.into_iter().map(|s| ContentPart::text(s.item.content)));
        messages.push(ChatMessage::new(MessageRole::User, content));

        Ok(messages)
    }

    pub async fn classify(&self, text: &str) -> Result<MessageKind, HydeError> {
        let label = self
            .language_model
            .classify(CLASSIFY_SYSTEM_PROMPT, text, &MessageKind::LABELS)
            .await?;

        MessageKind::from_str(&label)
            .map_err(|e| HydeError::LanguageModel(LanguageModelError::InvalidResponse(e)))
    }

    async fn candidate_chunks(
        &self,
        user: &AuthenticatedUser,
        selection: &[String],
    ) -> Result<Vec<RetrievedChunk>, HydeError> {
        if !self.scope_to_selection {
            return Ok(self.vector_index.fetch_all().await?);
        }

        let file_paths: Vec<String> = selection
            .iter()
            .filter_map(|name| FilePath::for_upload(&user.email, name).ok())
            .map(|path| path.as_str().to_string())
            .collect();

        Ok(self.vector_index.query_by_filter(&file_paths).await?)
    }
}
