use async_trait::async_trait;
use diesel::pg::upsert::excluded;
use diesel::prelude::*;

use crate::domain::entities::Chat;
use crate::domain::repositories::{ChatRepository, RepositoryError};
use crate::infrastructure::database::models::ChatModel;
use crate::infrastructure::database::schema::chats;
use crate::infrastructure::database::{DbPool, with_connection};

pub struct PostgresChatRepository {
    pool: DbPool,
}

impl PostgresChatRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PostgresChatRepository {
    async fn save(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let model = ChatModel::try_from(chat)?;

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(chats::table)
                .values(&model)
                .on_conflict(chats::id)
                .do_update()
                .set(chats::messages.eq(excluded(chats::messages)))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Chat>, RepositoryError> {
        let id = id.to_string();

        let model = with_connection(&self.pool, move |conn| {
            Ok(chats::table
                .find(id)
                .select(ChatModel::as_select())
                .first(conn)
                .optional()?)
        })
        .await?;

        model.map(Chat::try_from).transpose()
    }

    async fn find_by_author(&self, email: &str) -> Result<Vec<Chat>, RepositoryError> {
        let email = email.to_string();

        let models = with_connection(&self.pool, move |conn| {
            Ok(chats::table
                .filter(chats::author.eq(email))
                .order(chats::created_at.desc())
                .select(ChatModel::as_select())
                .load(conn)?)
        })
        .await?;

        models.into_iter().map(Chat::try_from).collect()
    }
}
