pub mod postgres_chat_repository;
pub mod postgres_chunk_repository;
pub mod postgres_session_repository;
pub mod postgres_user_repository;
pub mod postgres_vector_id_repository;

pub use postgres_chat_repository::PostgresChatRepository;
pub use postgres_chunk_repository::PostgresChunkRepository;
pub use postgres_session_repository::PostgresSessionRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use postgres_vector_id_repository::PostgresVectorIdRepository;
