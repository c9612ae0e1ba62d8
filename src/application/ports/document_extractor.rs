use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentExtractionError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),
}

#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    /// Pages that could not be read; the rest of the document is still returned.
    pub errors: Vec<String>,
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_text_from_bytes(
        &self,
        data: &[u8],
        file_type: &str,
    ) -> Result<ExtractedContent, DocumentExtractionError>;

    fn supported_formats(&self) -> Vec<String>;

    fn can_extract(&self, file_type: &str) -> bool;

    fn max_file_size(&self) -> Option<usize>;
}
