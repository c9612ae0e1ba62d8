use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::embedding_service::{EmbeddingService, EmbeddingServiceError};
use super::vector_index_service::{VectorIndexError, VectorIndexService};

#[derive(Debug, Error)]
pub enum KnowledgeSearchError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingServiceError),
    #[error("Vector index error: {0}")]
    VectorIndex(#[from] VectorIndexError),
}

/// One match as handed back to the model: `name` carries the chunk text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevantContent {
    pub name: String,
    pub similarity: f32,
}

/// Plain top-k lookup over the whole index, used by the `getInformation` tool.
pub struct KnowledgeSearch {
    embedding_service: Arc<EmbeddingService>,
    vector_index: Arc<VectorIndexService>,
    top_k: usize,
}

impl KnowledgeSearch {
    pub fn new(
        embedding_service: Arc<EmbeddingService>,
        vector_index: Arc<VectorIndexService>,
        top_k: usize,
    ) -> Self {
        Self {
            embedding_service,
            vector_index,
            top_k,
        }
    }

    pub async fn find_relevant_content(
        &self,
        question: &str,
    ) -> Result<Vec<RelevantContent>, KnowledgeSearchError> {
        tracing::debug!("Finding relevant content for query: {}", question);

        let vector = self.embedding_service.embed_text(question).await?;
        let matches = self
            .vector_index
            .query_by_vector(&vector, self.top_k, None)
            .await?;

        Ok(matches
            .into_iter()
            .map(|m| RelevantContent {
                name: m.metadata.content,
                similarity: m.score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::vector_store::InMemoryVectorStore;
    use crate::test_support::{InMemoryVectorIdRepository, KeywordEmbedder, chunk};

    #[tokio::test]
    async fn test_returns_best_matches_first_and_respects_top_k() {
        let embedding_service = Arc::new(EmbeddingService::new(Arc::new(KeywordEmbedder::new(&[
            "shift", "parking",
        ]))));
        let vector_index = Arc::new(VectorIndexService::new(
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(InMemoryVectorIdRepository::default()),
            3,
        ));
        vector_index
            .upsert_chunks(&[
                chunk("a@b.c/x.pdf", 0, "parking rules", [0.0, 1.0, 0.1]),
                chunk("a@b.c/x.pdf", 1, "shift times", [1.0, 0.0, 0.1]),
                chunk("a@b.c/x.pdf", 2, "shift and parking", [1.0, 1.0, 0.1]),
            ])
            .await
            .unwrap();
        let search = KnowledgeSearch::new(embedding_service, vector_index, 2);

        let found = search.find_relevant_content("shift").await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "shift times");
        assert_eq!(found[1].name, "shift and parking");
        assert!(found[0].similarity >= found[1].similarity);
    }
}
