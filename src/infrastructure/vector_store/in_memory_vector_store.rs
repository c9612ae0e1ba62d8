use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::application::ports::vector_store::{VectorQuery, VectorStore, VectorStoreError};
use crate::domain::entities::{ScoredRecord, VectorRecord};
use crate::domain::value_objects::{cosine_similarity, rank_top_k};

/// Process-local index with cosine scoring and the `filePath $in` filter.
#[derive(Default)]
pub struct InMemoryVectorStore {
    records: RwLock<BTreeMap<String, VectorRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<(), VectorStoreError> {
        let mut stored = self.records.write().await;
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(&self, query: VectorQuery) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        let stored = self.records.read().await;

        let candidates = stored
            .values()
            .filter(|record| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(&record.metadata))
            })
            .map(|record| {
                let score = cosine_similarity(query.vector.as_slice(), record.values.as_slice());
                (record, score)
            });

        Ok(rank_top_k(candidates, query.top_k)
            .into_iter()
            .map(|scored| ScoredRecord {
                id: scored.item.id.clone(),
                score: scored.score,
                metadata: scored.item.metadata.clone(),
            })
            .collect())
    }

    async fn delete_one(&self, id: &str) -> Result<(), VectorStoreError> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), VectorStoreError> {
        let mut stored = self.records.write().await;
        for id in ids {
            stored.remove(id);
        }
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<VectorRecord>, VectorStoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
