use async_trait::async_trait;
use std::sync::Arc;

use super::{PdfExtractor, PlainTextExtractor};
use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedContent,
};

pub struct CompositeDocumentExtractor {
    pdf_extractor: Arc<PdfExtractor>,
    text_extractor: Arc<PlainTextExtractor>,
}

impl CompositeDocumentExtractor {
    pub fn new() -> Self {
        Self {
            pdf_extractor: Arc::new(PdfExtractor::new()),
            text_extractor: Arc::new(PlainTextExtractor),
        }
    }

    fn get_extractor_for_type(&self, file_type: &str) -> Option<Arc<dyn DocumentExtractor>> {
        let file_type_lower = file_type.to_lowercase();

        if self.pdf_extractor.can_extract(&file_type_lower) {
            Some(self.pdf_extractor.clone())
        } else if self.text_extractor.can_extract(&file_type_lower) {
            Some(self.text_extractor.clone())
        } else {
            None
        }
    }
}

impl Default for CompositeDocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for CompositeDocumentExtractor {
    async fn extract_text_from_bytes(
        &self,
        data: &[u8],
        file_type: &str,
    ) -> Result<ExtractedContent, DocumentExtractionError> {
        let extractor = self
            .get_extractor_for_type(file_type)
            .ok_or_else(|| DocumentExtractionError::UnsupportedFormat(file_type.to_string()))?;

        extractor.extract_text_from_bytes(data, file_type).await
    }

    fn supported_formats(&self) -> Vec<String> {
        let mut formats = Vec::new();
        formats.extend(self.pdf_extractor.supported_formats());
        formats.extend(self.text_extractor.supported_formats());
        formats
    }

    fn can_extract(&self, file_type: &str) -> bool {
        self.get_extractor_for_type(file_type).is_some()
    }

    fn max_file_size(&self) -> Option<usize> {
        [
            self.pdf_extractor.max_file_size(),
            self.text_extractor.max_file_size(),
        ]
        .into_iter()
        .flatten()
        .max()
    }
}
