use async_trait::async_trait;
use lopdf::Document;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedContent,
};

const MAX_PDF_BYTES: usize = 100 * 1024 * 1024;

pub struct PdfExtractor {
    password: String,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            password: String::new(),
        }
    }

    fn load(&self, data: &[u8]) -> Result<Document, DocumentExtractionError> {
        let mut doc = Document::load_mem(data)
            .map_err(|e| DocumentExtractionError::CorruptedFile(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt(&self.password).map_err(|_e| {
                DocumentExtractionError::ExtractionFailed(
                    "Failed to decrypt PDF - invalid password".to_string(),
                )
            })?;
        }

        Ok(doc)
    }

    /// Page text in page order, plus one message per page that failed.
    fn extract_pages(doc: &Document) -> (String, i32, Vec<String>) {
        let page_numbers: Vec<u32> = doc.get_pages().into_keys().collect();
        let page_count = page_numbers.len() as i32;

        let extracted: Vec<Result<(u32, Vec<String>), String>> = page_numbers
            .into_par_iter()
            .map(|page_num| {
                let text = doc.extract_text(&[page_num]).map_err(|e| {
                    format!("Failed to extract text from page {}: {}", page_num, e)
                })?;

                let lines: Vec<String> = text
                    .split('\n')
                    .map(|s| s.trim_end().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();

                Ok((page_num, lines))
            })
            .collect();

        let mut pages = Vec::new();
        let mut errors = Vec::new();
        for result in extracted {
            match result {
                Ok((page_num, lines)) => pages.push((page_num, lines.join("\n"))),
                Err(e) => errors.push(e),
            }
        }
        pages.sort_by_key(|(page_num, _)| *page_num);

        let text = pages
            .into_iter()
            .map(|(_, text)| text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        (text, page_count, errors)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract_text_from_bytes(
        &self,
        data: &[u8],
        file_type: &str,
    ) -> Result<ExtractedContent, DocumentExtractionError> {
        if !self.can_extract(file_type) {
            return Err(DocumentExtractionError::UnsupportedFormat(file_type.to_string()));
        }

        let doc = self.load(data)?;
        let (text, page_count, errors) = tokio::task::spawn_blocking(move || {
            Self::extract_pages(&doc)
        })
        .await
        .map_err(|e| DocumentExtractionError::ExtractionFailed(e.to_string()))?;

        for error in &errors {
            tracing::warn!("{}", error);
        }
        tracing::debug!("Extracted {} characters from {} pages", text.len(), page_count);

        Ok(ExtractedContent {
            text,
            errors,
        })
    }

    fn supported_formats(&self) -> Vec<String> {
        vec!["application/pdf".to_string(), "pdf".to_string()]
    }

    fn can_extract(&self, file_type: &str) -> bool {
        matches!(file_type.to_lowercase().as_str(), "application/pdf" | "pdf")
    }

    fn max_file_size(&self) -> Option<usize> {
        Some(MAX_PDF_BYTES)
    }
}
