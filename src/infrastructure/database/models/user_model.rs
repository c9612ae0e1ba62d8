use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::entities::{Session, User, UserRole};
use crate::domain::repositories::RepositoryError;
use crate::domain::value_objects::PasswordHash;
use crate::infrastructure::database::schema::{sessions, users};

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserModel {
    pub email: String,
    pub password: Option<String>,
    pub role: String,
}

impl From<&User> for UserModel {
    fn from(user: &User) -> Self {
        Self {
            email: user.email().to_string(),
            password: user.password_hash().map(|hash| hash.as_str().to_string()),
            role: user.role().as_str().to_string(),
        }
    }
}

impl TryFrom<UserModel> for User {
    type Error = RepositoryError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        let role = model
            .role
            .parse::<UserRole>()
            .map_err(RepositoryError::SerializationError)?;

        Ok(User::new(
            model.email,
            model.password.map(PasswordHash::from_stored),
            role,
        ))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SessionModel {
    pub token: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for SessionModel {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.clone(),
            email: session.email.clone(),
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

impl From<SessionModel> for Session {
    fn from(model: SessionModel) -> Self {
        Session {
            token: model.token,
            email: model.email,
            created_at: model.created_at,
            expires_at: model.expires_at,
        }
    }
}
