use async_trait::async_trait;

use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedContent,
};

const FORMATS: &[&str] = &["txt", "md", "markdown", "text/plain", "text/markdown"];

#[derive(Debug, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    async fn extract_text_from_bytes(
        &self,
        data: &[u8],
        file_type: &str,
    ) -> Result<ExtractedContent, DocumentExtractionError> {
        if !self.can_extract(file_type) {
            return Err(DocumentExtractionError::UnsupportedFormat(file_type.to_string()));
        }

        let text = std::str::from_utf8(data)
            .map_err(|e| DocumentExtractionError::CorruptedFile(format!("Not UTF-8 text: {}", e)))?;

        Ok(ExtractedContent {
            text: text.trim_start_matches('\u{feff}').replace("\r\n", "\n"),
            errors: Vec::new(),
        })
    }

    fn supported_formats(&self) -> Vec<String> {
        FORMATS.iter().map(|f| f.to_string()).collect()
    }

    fn can_extract(&self, file_type: &str) -> bool {
        FORMATS.contains(&file_type.to_lowercase().as_str())
    }

    fn max_file_size(&self) -> Option<usize> {
        Some(10 * 1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_normalizes_line_endings_and_bom() {
        let content = PlainTextExtractor
            .extract_text_from_bytes("\u{feff}one\r\ntwo".as_bytes(), "txt")
            .await
            .unwrap();

        assert_eq!(content.text, "one\ntwo");
    }

    #[tokio::test]
    async fn test_rejects_binary() {
        let result = PlainTextExtractor
            .extract_text_from_bytes(&[0xff, 0xfe, 0x00], "text/plain")
            .await;

        assert!(matches!(result, Err(DocumentExtractionError::CorruptedFile(_))));
    }
}
