use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::entities::User;
use crate::domain::repositories::{RepositoryError, UserRepository};
use crate::infrastructure::database::models::UserModel;
use crate::infrastructure::database::schema::users;
use crate::infrastructure::database::{DbPool, with_connection};

pub struct PostgresUserRepository {
    pool: DbPool,
}

impl PostgresUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email = email.to_string();

        let model = with_connection(&self.pool, move |conn| {
            Ok(users::table
                .find(email)
                .select(UserModel::as_select())
                .first(conn)
                .optional()?)
        })
        .await?;

        model.map(User::try_from).transpose()
    }

    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        let model = UserModel::from(user);

        with_connection(&self.pool, move |conn| {
            diesel::insert_into(users::table)
                .values(&model)
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}
