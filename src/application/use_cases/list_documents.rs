use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::application::ports::BlobStorage;
use crate::domain::repositories::VectorIdRepository;
use crate::domain::value_objects::FilePath;

#[derive(Debug, Error)]
pub enum ListDocumentsError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

/// A stored document as shown to its owner; `pathname` has no owner prefix.
/// `indexed` is false for uploads whose text never reached the vector index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub pathname: String,
    pub url: String,
    pub indexed: bool,
}

pub struct ListDocumentsUseCase {
    blob_storage: Arc<dyn BlobStorage>,
    vector_id_repository: Arc<dyn VectorIdRepository>,
}

impl ListDocumentsUseCase {
    pub fn new(
        blob_storage: Arc<dyn BlobStorage>,
        vector_id_repository: Arc<dyn VectorIdRepository>,
    ) -> Self {
        Self {
            blob_storage,
            vector_id_repository,
        }
    }

    pub async fn execute(&self, owner_email: &str) -> Result<Vec<DocumentSummary>, ListDocumentsError> {
        let prefix = FilePath::owner_prefix(owner_email);
        let blobs = self
            .blob_storage
            .list(&prefix)
            .await
            .map_err(|e| ListDocumentsError::StorageError(e.to_string()))?;

        let indexed: HashSet<String> = match self.vector_id_repository.list_file_paths(&prefix).await {
            Ok(paths) => paths.into_iter().collect(),
            Err(e) => {
                tracing::warn!("Could not read indexed paths for {}: {}", owner_email, e);
                HashSet::new()
            }
        };

        let mut documents: Vec<DocumentSummary> = blobs
            .into_iter()
            .filter_map(|blob| {
                let name = blob.pathname.strip_prefix(&prefix)?.to_string();
                Some(DocumentSummary {
                    indexed: indexed.contains(&blob.pathname),
                    pathname: name,
                    url: blob.url,
                })
            })
            .collect();
        documents.sort_by(|a, b| a.pathname.cmp(&b.pathname));

        Ok(documents)
    }
}
