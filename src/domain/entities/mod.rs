pub mod chat;
pub mod chunk;
pub mod user;
pub mod vector_record;

pub use chat::{Chat, ChatMessage, ContentPart, MessageRole};
pub use chunk::Chunk;
pub use user::{Session, User, UserRole};
pub use vector_record::{RetrievedChunk, ScoredRecord, TrackedVectorIds, VectorMetadata, VectorRecord};
