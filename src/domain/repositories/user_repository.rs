use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::entities::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    /// Fails with `RepositoryError::Duplicate` when the email is taken.
    async fn create(&self, user: &User) -> Result<(), RepositoryError>;
}
