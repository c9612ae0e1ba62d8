use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::BlobStorage;
use crate::application::services::AuthenticatedUser;
use crate::application::services::VectorIndexService;
use crate::application::services::vector_index_service::DeleteOutcome;
use crate::domain::repositories::ChunkRepository;
use crate::domain::value_objects::FilePath;

#[derive(Debug, Error)]
pub enum DeleteDocumentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("You do not have permission to delete {0}")]
    Forbidden(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

#[derive(Debug, Clone)]
pub struct DeleteDocumentRequest {
    pub requester: AuthenticatedUser,
    pub file_url: String,
}

/// Removes a document everywhere it lives: vectors and their tracking row,
/// relational chunk rows, then the blob.
pub struct DeleteDocumentUseCase {
    blob_storage: Arc<dyn BlobStorage>,
    chunk_repository: Arc<dyn ChunkRepository>,
    vector_index: Arc<VectorIndexService>,
}

impl DeleteDocumentUseCase {
    pub fn new(
        blob_storage: Arc<dyn BlobStorage>,
        chunk_repository: Arc<dyn ChunkRepository>,
        vector_index: Arc<VectorIndexService>,
    ) -> Self {
        Self {
            blob_storage,
            chunk_repository,
            vector_index,
        }
    }

    pub async fn execute(
        &self,
        request: DeleteDocumentRequest,
    ) -> Result<DeleteOutcome, DeleteDocumentError> {
        let pathname = self
            .blob_storage
            .pathname_from_url(&request.file_url)
            .map_err(|e| DeleteDocumentError::ValidationError(e.to_string()))?;
        let file_path = FilePath::parse(&pathname).map_err(DeleteDocumentError::ValidationError)?;

        if !file_path.is_owned_by(&request.requester.email) && !request.requester.is_admin() {
            tracing::warn!(
                "{} attempted to delete {} without permission",
                request.requester.email,
                file_path
            );
            return Err(DeleteDocumentError::Forbidden(file_path.to_string()));
        }

        let outcome = self.vector_index.delete_by_file_path(file_path.as_str()).await;

        match self.chunk_repository.delete_by_file_path(file_path.as_str()).await {
            Ok(count) => tracing::debug!("Deleted {} chunk rows for {}", count, file_path),
            Err(e) => tracing::error!("Failed to delete chunk rows for {}: {}", file_path, e),
        }

        match self.blob_storage.delete(file_path.as_str()).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Blob {} was already gone", file_path),
            Err(e) => return Err(DeleteDocumentError::StorageError(e.to_string())),
        }

        tracing::info!("Deleted document {}", file_path);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::VectorStore;
    use crate::domain::entities::UserRole;
    use crate::domain::repositories::VectorIdRepository;
    use crate::infrastructure::vector_store::InMemoryVectorStore;
    use crate::test_support::{
        InMemoryBlobStorage, InMemoryChunkRepository, InMemoryVectorIdRepository, chunk,
    };

    struct Fixture {
        use_case: DeleteDocumentUseCase,
        blobs: Arc<InMemoryBlobStorage>,
        chunks: Arc<InMemoryChunkRepository>,
        store: Arc<InMemoryVectorStore>,
        tracking: Arc<InMemoryVectorIdRepository>,
    }

    async fn fixture() -> Fixture {
        let blobs = Arc::new(InMemoryBlobStorage::default());
        let chunks = Arc::new(InMemoryChunkRepository::default());
        let store = Arc::new(InMemoryVectorStore::new());
        let tracking = Arc::new(InMemoryVectorIdRepository::default());
        let vector_index = Arc::new(VectorIndexService::new(store.clone(), tracking.clone(), 2));

        let doc = vec![
            chunk("ann@x.io/rota.pdf", 0, "a", [1.0, 0.0]),
            chunk("ann@x.io/rota.pdf", 1, "b", [0.0, 1.0]),
        ];
        blobs.put("ann@x.io/rota.pdf", b"%PDF").await.unwrap();
        chunks.save_batch(&doc).await.unwrap();
        vector_index.upsert_chunks(&doc).await.unwrap();

        Fixture {
            use_case: DeleteDocumentUseCase::new(blobs.clone(), chunks.clone(), vector_index),
            blobs,
            chunks,
            store,
            tracking,
        }
    }

    fn requester(email: &str, role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            email: email.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_owner_deletes_everything() {
        let f = fixture().await;

        let outcome = f
            .use_case
            .execute(DeleteDocumentRequest {
                requester: requester("ann@x.io", UserRole::User),
                file_url: "memory://ann@x.io/rota.pdf".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted { deleted_count: 2 });
        assert!(!f.blobs.contains("ann@x.io/rota.pdf"));
        assert!(f.store.fetch_all().await.unwrap().is_empty());
        assert!(f.tracking.find_by_file_path("ann@x.io/rota.pdf").await.unwrap().is_none());
        assert!(f
            .chunks
            .chunks_of("ann@x.io/rota.pdf")
            .is_empty());
    }

    #[tokio::test]
    async fn test_admin_may_delete_other_users_documents() {
        let f = fixture().await;

        let outcome = f
            .use_case
            .execute(DeleteDocumentRequest {
                requester: requester("boss@x.io", UserRole::Admin),
                file_url: "memory://ann@x.io/rota.pdf".to_string(),
            })
            .await
            .unwrap();

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden_and_nothing_is_deleted() {
        let f = fixture().await;

        let result = f
            .use_case
            .execute(DeleteDocumentRequest {
                requester: requester("bob@x.io", UserRole::User),
                file_url: "memory://ann@x.io/rota.pdf".to_string(),
            })
            .await;

        assert!(matches!(result, Err(DeleteDocumentError::Forbidden(_))));
        assert!(f.blobs.contains("ann@x.io/rota.pdf"));
        assert_eq!(f.store.fetch_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_foreign_url_is_rejected() {
        let f = fixture().await;

        let result = f
            .use_case
            .execute(DeleteDocumentRequest {
                requester: requester("ann@x.io", UserRole::User),
                file_url: "https://elsewhere.example/ann@x.io/rota.pdf".to_string(),
            })
            .await;

        assert!(matches!(result, Err(DeleteDocumentError::ValidationError(_))));
    }
}
