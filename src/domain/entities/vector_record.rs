use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};

use super::Chunk;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorMetadata {
    #[serde(rename = "filePath", default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Copy of a chunk living in the hosted vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vector,
    pub metadata: VectorMetadata,
}

impl From<&Chunk> for VectorRecord {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id().to_string(),
            values: chunk.embedding().clone(),
            metadata: VectorMetadata {
                file_path: Some(chunk.file_path().to_string()),
                content: chunk.content().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub id: String,
    pub score: f32,
    pub metadata: VectorMetadata,
}

/// Chunk content as read back from the vector index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub file_path: String,
    pub content: String,
}

impl From<VectorRecord> for RetrievedChunk {
    fn from(record: VectorRecord) -> Self {
        Self {
            id: record.id,
            file_path: record.metadata.file_path.unwrap_or_default(),
            content: record.metadata.content,
        }
    }
}

impl From<ScoredRecord> for RetrievedChunk {
    fn from(record: ScoredRecord) -> Self {
        Self {
            id: record.id,
            file_path: record.metadata.file_path.unwrap_or_default(),
            content: record.metadata.content,
        }
    }
}

/// Vector ids written for one file path. The vector index cannot delete by
/// metadata filter, so this list is what a file delete walks.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedVectorIds {
    pub file_path: String,
    pub vector_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}
