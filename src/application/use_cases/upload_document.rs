use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::application::ports::{BlobStorage, DocumentExtractor};
use crate::application::services::EmbeddingService;
use crate::application::services::VectorIndexService;
use crate::application::services::text_splitter::{RTSplitter, RecursiveTextSplitter};
use crate::domain::entities::Chunk;
use crate::domain::repositories::ChunkRepository;
use crate::domain::value_objects::FilePath;

#[derive(Debug, Error)]
pub enum UploadDocumentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

#[derive(Debug, Clone)]
pub struct UploadDocumentRequest {
    pub owner_email: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// The blob is always kept once written; only indexing can fail afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "UploadOutcomeBody")]
pub enum UploadDocumentOutcome {
    Indexed {
        file_url: String,
        pathname: String,
        chunk_count: usize,
    },
    StoredNotIndexed {
        file_url: String,
        message: String,
    },
}

impl UploadDocumentOutcome {
    pub fn is_indexed(&self) -> bool {
        matches!(self, UploadDocumentOutcome::Indexed { .. })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadOutcomeBody {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    file_url: String,
}

impl From<UploadDocumentOutcome> for UploadOutcomeBody {
    fn from(outcome: UploadDocumentOutcome) -> Self {
        match outcome {
            UploadDocumentOutcome::Indexed { file_url, .. } => Self {
                success: true,
                message: None,
                file_url,
            },
            UploadDocumentOutcome::StoredNotIndexed { file_url, message } => Self {
                success: false,
                message: Some(message),
                file_url,
            },
        }
    }
}

pub struct UploadDocumentUseCase {
    blob_storage: Arc<dyn BlobStorage>,
    document_extractor: Arc<dyn DocumentExtractor>,
    embedding_service: Arc<EmbeddingService>,
    chunk_repository: Arc<dyn ChunkRepository>,
    vector_index: Arc<VectorIndexService>,
    text_splitter: RTSplitter,
    chunk_size: usize,
}

impl UploadDocumentUseCase {
    pub fn new(
        blob_storage: Arc<dyn BlobStorage>,
        document_extractor: Arc<dyn DocumentExtractor>,
        embedding_service: Arc<EmbeddingService>,
        chunk_repository: Arc<dyn ChunkRepository>,
        vector_index: Arc<VectorIndexService>,
        chunk_size: usize,
    ) -> Self {
        Self {
            blob_storage,
            document_extractor,
            embedding_service,
            chunk_repository,
            vector_index,
            text_splitter: RTSplitter::default(),
            chunk_size,
        }
    }

    pub async fn execute(
        &self,
        request: UploadDocumentRequest,
    ) -> Result<UploadDocumentOutcome, UploadDocumentError> {
        // Validate input
        let filename = request
            .filename
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                UploadDocumentError::ValidationError("filename query parameter is required".to_string())
            })?;

        if request.data.is_empty() {
            return Err(UploadDocumentError::ValidationError(
                "Request body is empty".to_string(),
            ));
        }

        let file_path = FilePath::for_upload(&request.owner_email, filename)
            .map_err(UploadDocumentError::ValidationError)?;

        let file_type = detect_file_type(filename, request.content_type.as_deref());
        if !self.document_extractor.can_extract(&file_type) {
            return Err(UploadDocumentError::ValidationError(format!(
                "Unsupported file type: {} (supported: {})",
                file_type,
                self.document_extractor.supported_formats().join(", ")
            )));
        }

        if let Some(max) = self.document_extractor.max_file_size() {
            if request.data.len() > max {
                return Err(UploadDocumentError::ValidationError(format!(
                    "File exceeds the maximum size of {} bytes",
                    max
                )));
            }
        }

        // Store the raw file
        let blob = self
            .blob_storage
            .put(file_path.as_str(), &request.data)
            .await
            .map_err(|e| UploadDocumentError::StorageError(e.to_string()))?;

        tracing::info!("Stored {} ({} bytes)", blob.pathname, blob.size);

        match self.index(&file_path, &file_type, &request.data).await {
            Ok(chunk_count) => Ok(UploadDocumentOutcome::Indexed {
                file_url: blob.url,
                pathname: blob.pathname,
                chunk_count,
            }),
            Err(message) => {
                tracing::error!("Indexing {} failed: {}", file_path, message);
                Ok(UploadDocumentOutcome::StoredNotIndexed {
                    file_url: blob.url,
                    message: format!("File uploaded but could not be indexed: {}", message),
                })
            }
        }
    }

    async fn index(&self, file_path: &FilePath, file_type: &str, data: &[u8]) -> Result<usize, String> {
        let extracted = self
            .document_extractor
            .extract_text_from_bytes(data, file_type)
            .await
            .map_err(|e| e.to_string())?;

        if !extracted.errors.is_empty() {
            tracing::warn!(
                "{} page(s) of {} could not be read",
                extracted.errors.len(),
                file_path
            );
        }

        let texts: Vec<String> = self
            .text_splitter
            .split_text(&extracted.text, self.chunk_size)
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .map(str::to_string)
            .collect();

        if texts.is_empty() {
            return Err("no text could be extracted".to_string());
        }

        let embeddings = self
            .embedding_service
            .embed_many(&texts)
            .await
            .map_err(|e| e.to_string())?;

        let chunks: Vec<Chunk> = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| {
                Chunk::new(file_path.as_str().to_string(), i, content, embedding)
            })
            .collect();

        self.chunk_repository
            .save_batch(&chunks)
            .await
            .map_err(|e| e.to_string())?;

        self.vector_index
            .upsert_chunks(&chunks)
            .await
            .map_err(|e| e.to_string())?;

        tracing::info!("Indexed {} chunks for {}", chunks.len(), file_path);
        Ok(chunks.len())
    }
}

/// Lowercased extension of `filename`, falling back to the content type.
pub fn detect_file_type(filename: &str, content_type: Option<&str>) -> String {
    match filename.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => {
            extension.to_lowercase()
        }
        _ => content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_lowercase())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{EmbeddingProvider, VectorStore};
    use crate::domain::repositories::VectorIdRepository;
    use crate::infrastructure::external_services::document_extractors::PlainTextExtractor;
    use crate::infrastructure::vector_store::InMemoryVectorStore;
    use crate::test_support::{
        FailingEmbedder, InMemoryBlobStorage, InMemoryChunkRepository,
        InMemoryVectorIdRepository, KeywordEmbedder,
    };
    use serde_json::json;

    struct Fixture {
        use_case: UploadDocumentUseCase,
        blobs: Arc<InMemoryBlobStorage>,
        chunks: Arc<InMemoryChunkRepository>,
        store: Arc<InMemoryVectorStore>,
        tracking: Arc<InMemoryVectorIdRepository>,
        embedder_calls: Box<dyn Fn() -> usize>,
    }

    fn fixture_with(embedder: Arc<dyn EmbeddingProvider>, calls: Box<dyn Fn() -> usize>) -> Fixture {
        let blobs = Arc::new(InMemoryBlobStorage::default());
        let chunks = Arc::new(InMemoryChunkRepository::default());
        let store = Arc::new(InMemoryVectorStore::new());
        let tracking = Arc::new(InMemoryVectorIdRepository::default());
        let vector_index = Arc::new(VectorIndexService::new(store.clone(), tracking.clone(), 3));

        Fixture {
            use_case: UploadDocumentUseCase::new(
                blobs.clone(),
                Arc::new(PlainTextExtractor::default()),
                Arc::new(EmbeddingService::new(embedder)),
                chunks.clone(),
                vector_index,
                30,
            ),
            blobs,
            chunks,
            store,
            tracking,
            embedder_calls: calls,
        }
    }

    fn fixture() -> Fixture {
        let embedder = Arc::new(KeywordEmbedder::new(&["shift", "parking"]));
        let counter = embedder.clone();
        fixture_with(embedder, Box::new(move || counter.calls()))
    }

    fn request(filename: Option<&str>, body: &str) -> UploadDocumentRequest {
        UploadDocumentRequest {
            owner_email: "a@b.c".to_string(),
            filename: filename.map(str::to_string),
            content_type: Some("text/plain".to_string()),
            data: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_stores_chunks_vectors_and_tracking() {
        let f = fixture();

        let outcome = f
            .use_case
            .execute(request(Some("rota.txt"), "Shift starts at 8am.\n\nParking is at the back."))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            UploadDocumentOutcome::Indexed {
                file_url: "memory://a@b.c/rota.txt".to_string(),
                pathname: "a@b.c/rota.txt".to_string(),
                chunk_count: 2,
            }
        );
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"success": true, "fileUrl": "memory://a@b.c/rota.txt"})
        );

        let rows = f
            .chunks
            .chunks_of("a@b.c/rota.txt");
        let ids: Vec<&str> = rows.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["a@b.c/rota.txt/0", "a@b.c/rota.txt/1"]);
        assert_eq!(rows[0].content(), "Shift starts at 8am.");

        assert_eq!(f.store.fetch_all().await.unwrap().len(), 2);
        let tracked = f.tracking.find_by_file_path("a@b.c/rota.txt").await.unwrap().unwrap();
        assert_eq!(tracked.vector_ids.len(), 2);
        assert!(f.blobs.contains("a@b.c/rota.txt"));
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected_before_embedding() {
        let f = fixture();

        let result = f.use_case.execute(request(Some("rota.txt"), "")).await;

        assert!(matches!(result, Err(UploadDocumentError::ValidationError(_))));
        assert_eq!((f.embedder_calls)(), 0);
        assert!(!f.blobs.contains("a@b.c/rota.txt"));
    }

    #[tokio::test]
    async fn test_missing_filename_is_rejected() {
        let f = fixture();

        for filename in [None, Some("  "), Some("../etc/passwd")] {
            let result = f.use_case.execute(request(filename, "text")).await;
            assert!(matches!(result, Err(UploadDocumentError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_unsupported_type_is_rejected() {
        let f = fixture();
        let mut req = request(Some("photo.png"), "xxxx");
        req.content_type = Some("image/png".to_string());

        let result = f.use_case.execute(req).await;

        match result {
            Err(UploadDocumentError::ValidationError(message)) => {
                assert!(message.contains("png"));
                assert!(message.contains("text/plain"));
            }
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_indexing_failure_keeps_blob_and_reports_url() {
        let f = fixture_with(Arc::new(FailingEmbedder), Box::new(|| 0));

        let outcome = f
            .use_case
            .execute(request(Some("rota.txt"), "Shift starts at 8am."))
            .await
            .unwrap();

        assert!(!outcome.is_indexed());
        let body = serde_json::to_value(&outcome).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["fileUrl"], "memory://a@b.c/rota.txt");
        assert!(body["message"].as_str().unwrap().contains("could not be indexed"));
        assert!(f.blobs.contains("a@b.c/rota.txt"));
        assert!(f.store.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_only_document_is_not_indexed() {
        let f = fixture();

        let outcome = f
            .use_case
            .execute(request(Some("blank.txt"), " \n\n \n"))
            .await
            .unwrap();

        assert!(!outcome.is_indexed());
        assert_eq!((f.embedder_calls)(), 0);
    }

    #[test]
    fn test_detect_file_type() {
        assert_eq!(detect_file_type("Report.PDF", None), "pdf");
        assert_eq!(detect_file_type("notes", Some("text/plain; charset=utf-8")), "text/plain");
        assert_eq!(detect_file_type(".hidden", None), "");
    }
}
