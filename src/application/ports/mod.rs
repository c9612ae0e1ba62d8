pub mod blob_storage;
pub mod document_extractor;
pub mod embedding_provider;
pub mod language_model;
pub mod vector_store;

pub use blob_storage::BlobStorage;
pub use document_extractor::DocumentExtractor;
pub use embedding_provider::EmbeddingProvider;
pub use language_model::LanguageModel;
pub use vector_store::VectorStore;
