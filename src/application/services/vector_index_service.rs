use std::collections::BTreeMap;
use std::sync::Arc;

use pgvector::Vector;
use serde::Serialize;
use thiserror::Error;

use crate::application::ports::VectorStore;
use crate::application::ports::vector_store::{MetadataFilter, VectorQuery, VectorStoreError};
use crate::domain::entities::{Chunk, RetrievedChunk, ScoredRecord, VectorRecord};
use crate::domain::repositories::{RepositoryError, VectorIdRepository};

const DELETE_BATCH_SIZE: usize = 100;
const FILTER_QUERY_TOP_K: usize = 1000;

#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("Vector store error: {0}")]
    Store(#[from] VectorStoreError),
    #[error("Tracking table error: {0}")]
    Tracking(#[from] RepositoryError),
    #[error("Chunk {id} has {actual} dimensions, the index expects {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },
}

/// Result of removing a file's vectors. The tracking row is gone in both cases.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "DeleteOutcomeBody")]
pub enum DeleteOutcome {
    Deleted { deleted_count: usize },
    Failed { error: String, deleted_count: usize },
}

impl DeleteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted { .. })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteOutcomeBody {
    success: bool,
    deleted_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<DeleteOutcome> for DeleteOutcomeBody {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted { deleted_count } => Self {
                success: true,
                deleted_count,
                error: None,
            },
            DeleteOutcome::Failed {
                error,
                deleted_count,
            } => Self {
                success: false,
                deleted_count,
                error: Some(error),
            },
        }
    }
}

/// Keeps the hosted vector index and the relational id-tracking table in step.
///
/// The two writes are not transactional. Tracking ids are written before the
/// vectors, so a failed upsert leaves a tracking row pointing at ids that may
/// not exist; deleting such a file path is still safe.
pub struct VectorIndexService {
    vector_store: Arc<dyn VectorStore>,
    vector_id_repository: Arc<dyn VectorIdRepository>,
    embedding_dimension: usize,
}

impl VectorIndexService {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        vector_id_repository: Arc<dyn VectorIdRepository>,
        embedding_dimension: usize,
    ) -> Self {
        Self {
            vector_store,
            vector_id_repository,
            embedding_dimension,
        }
    }

    pub async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<(), VectorIndexError> {
        if chunks.is_empty() {
            return Ok(());
        }
        if let Some(bad) = chunks
            .iter()
            .find(|chunk| chunk.dimension() != self.embedding_dimension)
        {
            return Err(VectorIndexError::DimensionMismatch {
                id: bad.id().to_string(),
                expected: self.embedding_dimension,
                actual: bad.dimension(),
            });
        }

        let mut ids_by_path: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for chunk in chunks {
            ids_by_path
                .entry(chunk.file_path())
                .or_default()
                .push(chunk.id().to_string());
        }

        for (file_path, ids) in &ids_by_path {
            self.vector_id_repository.store(file_path, ids).await?;
        }

        let records: Vec<VectorRecord> = chunks.iter().map(VectorRecord::from).collect();
        self.vector_store.upsert(&records).await?;

        tracing::info!(
            "Upserted {} vectors for {} file(s)",
            records.len(),
            ids_by_path.len()
        );
        Ok(())
    }

    /// Chunks stored under any of `file_paths`, found by metadata alone.
    pub async fn query_by_filter(
        &self,
        file_paths: &[String],
    ) -> Result<Vec<RetrievedChunk>, VectorIndexError> {
        if file_paths.is_empty() {
            return Ok(Vec::new());
        }

        let matches = self
            .vector_store
            .query(VectorQuery {
                vector: Vector::from(vec![0.0; self.embedding_dimension]),
                top_k: FILTER_QUERY_TOP_K,
                filter: Some(MetadataFilter::FilePathIn(file_paths.to_vec())),
            })
            .await?;

        Ok(matches.into_iter().map(RetrievedChunk::from).collect())
    }

    pub async fn query_by_vector(
        &self,
        vector: &Vector,
        top_k: usize,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<ScoredRecord>, VectorIndexError> {
        let matches = self
            .vector_store
            .query(VectorQuery {
                vector: vector.clone(),
                top_k,
                filter,
            })
            .await?;

        tracing::debug!("Vector query returned {} matches", matches.len());
        Ok(matches)
    }

    pub async fn fetch_all(&self) -> Result<Vec<RetrievedChunk>, VectorIndexError> {
        let records = self.vector_store.fetch_all().await?;
        Ok(records.into_iter().map(RetrievedChunk::from).collect())
    }

    /// Deletes the tracked vectors one at a time, then always drops the
    /// tracking row. Never returns an error; failures are reported in the outcome.
    pub async fn delete_by_file_path(&self, file_path: &str) -> DeleteOutcome {
        let tracked = match self.vector_id_repository.find_by_file_path(file_path).await {
            Ok(tracked) => tracked,
            Err(e) => {
                tracing::error!("Failed to read tracked vector ids for {}: {}", file_path, e);
                self.drop_tracking_row(file_path).await;
                return DeleteOutcome::Failed {
                    error: e.to_string(),
                    deleted_count: 0,
                };
            }
        };

        let ids = tracked.map(|t| t.vector_ids).unwrap_or_default();
        let mut deleted_count = 0;
        let mut failures = Vec::new();

        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            for id in batch {
                match self.vector_store.delete_one(id).await {
                    Ok(()) => deleted_count += 1,
                    Err(e) => {
                        tracing::error!("Error deleting vector {}: {}", id, e);
                        failures.push(id.clone());
                    }
                }
            }
        }

        self.drop_tracking_row(file_path).await;

        if failures.is_empty() {
            tracing::info!("Deleted {} vectors for {}", deleted_count, file_path);
            DeleteOutcome::Deleted { deleted_count }
        } else {
            DeleteOutcome::Failed {
                error: format!(
                    "Failed to delete {} of {} vectors: {}",
                    failures.len(),
                    ids.len(),
                    failures.join(", ")
                ),
                deleted_count,
            }
        }
    }

    /// Delete-then-upsert by id, used when a record's content changes.
    pub async fn replace_records(&self, records: &[VectorRecord]) -> Result<(), VectorIndexError> {
        if records.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        self.vector_store.delete_many(&ids).await?;
        self.vector_store.upsert(records).await?;
        Ok(())
    }

    async fn drop_tracking_row(&self, file_path: &str) {
        if let Err(e) = self.vector_id_repository.delete_by_file_path(file_path).await {
            tracing::error!("Error deleting tracking record for {}: {}", file_path, e);
        }
    }
}
