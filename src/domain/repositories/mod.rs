pub mod chat_repository;
pub mod chunk_repository;
pub mod session_repository;
pub mod user_repository;
pub mod vector_id_repository;

pub use chat_repository::ChatRepository;
pub use chunk_repository::ChunkRepository;
pub use session_repository::SessionRepository;
pub use user_repository::UserRepository;
pub use vector_id_repository::VectorIdRepository;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Duplicate: {0}")]
    Duplicate(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
