use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::entities::Session;
use crate::domain::repositories::{RepositoryError, SessionRepository};
use crate::infrastructure::database::models::SessionModel;
use crate::infrastructure::database::schema::sessions;
use crate::infrastructure::database::{DbPool, with_connection};

pub struct PostgresSessionRepository {
    pool: DbPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        let model = SessionModel::from(session);

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(sessions::table)
                .values(&model)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn find_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, RepositoryError> {
        let token = token.to_string();

        let model = with_connection(&self.pool, move |conn| {
            Ok(sessions::table
                .filter(sessions::token.eq(token))
                .filter(sessions::expires_at.gt(now))
                .select(SessionModel::as_select())
                .first(conn)
                .optional()?)
        })
        .await?;

        Ok(model.map(Session::from))
    }

    async fn delete(&self, token: &str) -> Result<bool, RepositoryError> {
        let token = token.to_string();

        let deleted_count = with_connection(&self.pool, move |conn| {
            Ok(diesel::delete(sessions::table.find(token)).execute(conn)?)
        })
        .await?;

        Ok(deleted_count > 0)
    }
}
