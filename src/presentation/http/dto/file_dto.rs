use serde::{Deserialize, Serialize};

use crate::application::use_cases::list_documents::DocumentSummary;

#[derive(Debug, Deserialize)]
pub struct UploadQueryDto {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQueryDto {
    pub fileurl: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileResponseDto {
    pub pathname: String,
    pub url: String,
    pub indexed: bool,
}

impl From<DocumentSummary> for FileResponseDto {
    fn from(summary: DocumentSummary) -> Self {
        Self {
            pathname: summary.pathname,
            url: summary.url,
            indexed: summary.indexed,
        }
    }
}

/// Error body of the upload endpoint, which never uses the envelope.
#[derive(Debug, Serialize)]
pub struct UploadErrorDto {
    pub success: bool,
    pub message: String,
}

impl UploadErrorDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
