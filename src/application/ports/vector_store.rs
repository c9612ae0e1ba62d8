use async_trait::async_trait;
use pgvector::Vector;
use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::entities::{ScoredRecord, VectorMetadata, VectorRecord};

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Vector store returned {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataFilter {
    FilePathIn(Vec<String>),
}

impl MetadataFilter {
    pub fn matches(&self, metadata: &VectorMetadata) -> bool {
        match self {
            MetadataFilter::FilePathIn(paths) => metadata
                .file_path
                .as_ref()
                .is_some_and(|path| paths.contains(path)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            MetadataFilter::FilePathIn(paths) => json!({ "filePath": { "$in": paths } }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VectorQuery {
    pub vector: Vector,
    pub top_k: usize,
    pub filter: Option<MetadataFilter>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Records with an existing id are overwritten.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<(), VectorStoreError>;

    /// Nearest neighbours by cosine score, best first, metadata included.
    async fn query(&self, query: VectorQuery) -> Result<Vec<ScoredRecord>, VectorStoreError>;

    async fn delete_one(&self, id: &str) -> Result<(), VectorStoreError>;

    async fn delete_many(&self, ids: &[String]) -> Result<(), VectorStoreError>;

    /// Every record in the index.
    async fn fetch_all(&self) -> Result<Vec<VectorRecord>, VectorStoreError>;
}
