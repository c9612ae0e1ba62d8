use std::sync::Arc;

use regex::{NoExpand, RegexBuilder};
use serde::Serialize;

use super::embedding_service::EmbeddingService;
use super::vector_index_service::VectorIndexService;
use crate::domain::entities::{VectorMetadata, VectorRecord};
use crate::domain::repositories::ChunkRepository;

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub search_query: String,
    pub new_content: String,
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "UpdateOutcomeBody")]
pub enum UpdateOutcome {
    Updated {
        updated_chunks: usize,
        old_content: String,
        new_content: String,
    },
    Failed {
        message: String,
    },
}

impl UpdateOutcome {
    fn failed(reason: impl std::fmt::Display) -> Self {
        UpdateOutcome::Failed {
            message: format!("Failed to update content: {}", reason),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOutcomeBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_content: Option<String>,
}

impl From<UpdateOutcome> for UpdateOutcomeBody {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Updated {
                updated_chunks,
                old_content,
                new_content,
            } => Self {
                success: true,
                message: format!("Content updated successfully in {} chunks", updated_chunks),
                updated_chunks: Some(updated_chunks),
                old_content: Some(old_content),
                new_content: Some(new_content),
            },
            UpdateOutcome::Failed { message } => Self {
                success: false,
                message,
                updated_chunks: None,
                old_content: None,
                new_content: None,
            },
        }
    }
}

/// Rewrites a phrase inside the chunks nearest to it.
///
/// All `top_k` nearest chunks are rewritten, not only the best match, and a
/// chunk that does not literally contain the phrase is re-embedded unchanged.
pub struct ContentUpdater {
    embedding_service: Arc<EmbeddingService>,
    vector_index: Arc<VectorIndexService>,
    chunk_repository: Arc<dyn ChunkRepository>,
    top_k: usize,
}

impl ContentUpdater {
    pub fn new(
        embedding_service: Arc<EmbeddingService>,
        vector_index: Arc<VectorIndexService>,
        chunk_repository: Arc<dyn ChunkRepository>,
        top_k: usize,
    ) -> Self {
        Self {
            embedding_service,
            vector_index,
            chunk_repository,
            top_k,
        }
    }

    pub async fn update(&self, request: &UpdateRequest) -> UpdateOutcome {
        tracing::info!(
            "Updating content: {:?} -> {:?} (context: {:?})",
            request.search_query,
            request.new_content,
            request.context
        );

        if request.search_query.trim().is_empty() {
            return UpdateOutcome::failed("search query is empty");
        }

        let pattern = match RegexBuilder::new(&regex::escape(&request.search_query))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => pattern,
            Err(e) => return UpdateOutcome::failed(e),
        };

        let query_vector = match self.embedding_service.embed_text(&request.search_query).await {
            Ok(vector) => vector,
            Err(e) => return UpdateOutcome::failed(e),
        };

        let matches = match self
            .vector_index
            .query_by_vector(&query_vector, self.top_k, None)
            .await
        {
            Ok(matches) => matches,
            Err(e) => return UpdateOutcome::failed(e),
        };

        if matches.is_empty() {
            return UpdateOutcome::failed("Could not find matching content to update");
        }

        let rewritten: Vec<String> = matches
            .iter()
            .map(|m| {
                pattern
                    .replace(&m.metadata.content, NoExpand(&request.new_content))
                    .into_owned()
            })
            .collect();

        let embeddings = match self.embedding_service.embed_each_concurrently(&rewritten).await {
            Ok(embeddings) => embeddings,
            Err(e) => return UpdateOutcome::failed(e),
        };

        let records: Vec<VectorRecord> = matches
            .iter()
            .zip(rewritten.iter())
            .zip(embeddings)
            .map(|((m, content), values)| VectorRecord {
                id: m.id.clone(),
                values,
                metadata: VectorMetadata {
                    file_path: m.metadata.file_path.clone(),
                    content: content.clone(),
                },
            })
            .collect();

        if let Err(e) = self.vector_index.replace_records(&records).await {
            return UpdateOutcome::failed(e);
        }

        for record in &records {
            match self
                .chunk_repository
                .update_content(&record.id, &record.metadata.content, &record.values)
                .await
            {
                Ok(true) => {}
                Ok(false) => tracing::warn!("No relational chunk row for vector {}", record.id),
                Err(e) => tracing::error!("Failed to mirror update of chunk {}: {}", record.id, e),
            }
        }

        tracing::info!("Updated {} chunks", records.len());

        UpdateOutcome::Updated {
            updated_chunks: records.len(),
            old_content: matches[0].metadata.content.clone(),
            new_content: records[0].metadata.content.clone(),
        }
    }
}
