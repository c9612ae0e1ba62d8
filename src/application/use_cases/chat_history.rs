use std::sync::Arc;

use crate::domain::entities::Chat;
use crate::domain::repositories::{ChatRepository, RepositoryError};

pub struct ChatHistoryUseCase {
    chat_repository: Arc<dyn ChatRepository>,
}

impl ChatHistoryUseCase {
    pub fn new(chat_repository: Arc<dyn ChatRepository>) -> Self {
        Self { chat_repository }
    }

    /// The author's chats, newest first.
    pub async fn list(&self, author: &str) -> Result<Vec<Chat>, RepositoryError> {
        self.chat_repository.find_by_author(author).await
    }

    /// `None` both when the chat does not exist and when someone else wrote it.
    pub async fn get(&self, id: &str, author: &str) -> Result<Option<Chat>, RepositoryError> {
        Ok(self
            .chat_repository
            .find_by_id(id)
            .await?
            .filter(|chat| chat.author == author))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ChatMessage;
    use crate::test_support::InMemoryChatRepository;
    use chrono::{Duration, Utc};

    fn chat(id: &str, author: &str, minutes_ago: i64) -> Chat {
        Chat {
            id: id.to_string(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            messages: vec![ChatMessage::user("hi")],
            author: author.to_string(),
        }
    }

    #[tokio::test]
    async fn test_history_is_per_author_and_newest_first() {
        let repository = Arc::new(InMemoryChatRepository::default());
        repository.save(&chat("old", "ann@x.io", 30)).await.unwrap();
        repository.save(&chat("new", "ann@x.io", 1)).await.unwrap();
        repository.save(&chat("bobs", "bob@x.io", 5)).await.unwrap();
        let history = ChatHistoryUseCase::new(repository);

        let ids: Vec<String> = history
            .list("ann@x.io")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();

        assert_eq!(ids, vec!["new", "old"]);
        assert!(history.get("bobs", "ann@x.io").await.unwrap().is_none());
        assert!(history.get("old", "ann@x.io").await.unwrap().is_some());
    }
}
