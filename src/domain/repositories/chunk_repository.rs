use async_trait::async_trait;
use pgvector::Vector;

use super::RepositoryError;
use crate::domain::entities::Chunk;

#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Re-saving an existing id replaces its content and embedding.
    async fn save_batch(&self, chunks: &[Chunk]) -> Result<(), RepositoryError>;
    async fn update_content(
        &self,
        id: &str,
        content: &str,
        embedding: &Vector,
    ) -> Result<bool, RepositoryError>;
    async fn delete_by_file_path(&self, file_path: &str) -> Result<i64, RepositoryError>;
}
