pub mod composite_extractor;
pub mod pdf_extractor;
pub mod plain_text_extractor;

pub use composite_extractor::CompositeDocumentExtractor;
pub use pdf_extractor::PdfExtractor;
pub use plain_text_extractor::PlainTextExtractor;
