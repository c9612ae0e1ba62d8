pub mod auth_service;
pub mod chat_service;
pub mod content_updater;
pub mod embedding_service;
pub mod hyde_retriever;
pub mod knowledge_search;
pub mod text_splitter;
pub mod tools;
pub mod vector_index_service;

pub use auth_service::{AuthService, AuthenticatedUser};
pub use chat_service::ChatService;
pub use content_updater::ContentUpdater;
pub use embedding_service::EmbeddingService;
pub use hyde_retriever::HydeRetriever;
pub use knowledge_search::KnowledgeSearch;
pub use tools::KnowledgeTools;
pub use vector_index_service::VectorIndexService;
