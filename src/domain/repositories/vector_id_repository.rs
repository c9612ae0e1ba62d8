use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::entities::TrackedVectorIds;

#[async_trait]
pub trait VectorIdRepository: Send + Sync {
    /// Replaces any list already stored for the file path.
    async fn store(&self, file_path: &str, vector_ids: &[String]) -> Result<(), RepositoryError>;
    async fn find_by_file_path(
        &self,
        file_path: &str,
    ) -> Result<Option<TrackedVectorIds>, RepositoryError>;
    async fn delete_by_file_path(&self, file_path: &str) -> Result<bool, RepositoryError>;
    async fn list_file_paths(&self, prefix: &str) -> Result<Vec<String>, RepositoryError>;
}
