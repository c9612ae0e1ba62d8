use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::entities::Chat;

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Inserts the chat on its first turn, afterwards overwrites the whole
    /// message list. `created_at` and `author` of an existing chat are kept.
    async fn save(&self, chat: &Chat) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Chat>, RepositoryError>;
    /// Newest first.
    async fn find_by_author(&self, email: &str) -> Result<Vec<Chat>, RepositoryError>;
}
