use std::sync::Arc;

use futures::future::try_join_all;
use pgvector::Vector;
use thiserror::Error;

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, EmbeddingProvider, EmbeddingRequest,
};

#[derive(Debug, Error)]
pub enum EmbeddingServiceError {
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub struct EmbeddingService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingService {
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedding_provider }
    }

    pub async fn embed_text(&self, text: &str) -> Result<Vector, EmbeddingServiceError> {
        if text.trim().is_empty() {
            return Err(EmbeddingServiceError::ValidationError(
                "Cannot generate embedding for empty text".to_string(),
            ));
        }

        let response = self
            .embedding_provider
            .generate_embedding(EmbeddingRequest {
                text: text.to_string(),
            })
            .await
            .map_err(|e| EmbeddingServiceError::ProviderError(e.to_string()))?;

        tracing::debug!(
            "Embedded 1 text with {} ({:?} tokens)",
            response.model_name,
            response.token_count
        );
        self.check_dimension(&response.embedding)?;
        Ok(response.embedding)
    }

    /// One batched call; the result is index-aligned with `texts`.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if texts.iter().any(|text| text.trim().is_empty()) {
            return Err(EmbeddingServiceError::ValidationError(
                "Cannot generate embedding for empty text".to_string(),
            ));
        }

        let response = self
            .embedding_provider
            .generate_embeddings(BatchEmbeddingRequest {
                texts: texts.to_vec(),
            })
            .await
            .map_err(|e| EmbeddingServiceError::ProviderError(e.to_string()))?;

        if response.embeddings.len() != texts.len() {
            return Err(EmbeddingServiceError::ProviderError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        tracing::debug!(
            "Embedded {} texts with {} ({:?} tokens)",
            texts.len(),
            response.model_name,
            response.total_tokens
        );
        for embedding in &response.embeddings {
            self.check_dimension(embedding)?;
        }
        Ok(response.embeddings)
    }

    /// One call per text, all in flight at once. Any failure fails the whole set.
    pub async fn embed_each_concurrently(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vector>, EmbeddingServiceError> {
        try_join_all(texts.iter().map(|text| self.embed_text(text))).await
    }

    fn check_dimension(&self, embedding: &Vector) -> Result<(), EmbeddingServiceError> {
        let expected = self.embedding_provider.embedding_dimension();
        let actual = embedding.as_slice().len();
        if actual != expected {
            return Err(EmbeddingServiceError::ProviderError(format!(
                "Expected a {}-dimensional embedding, got {}",
                expected, actual
            )));
        }
        Ok(())
    }
}
