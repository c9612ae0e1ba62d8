use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{Session, User, UserRole};
use crate::domain::repositories::{RepositoryError, SessionRepository, UserRepository};
use crate::domain::value_objects::PasswordHash;

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AuthError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Duplicate(_) => AuthError::EmailTaken,
            other => AuthError::Repository(other),
        }
    }
}

/// The caller of a request, resolved from a session token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub token: String,
    pub email: String,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    session_repository: Arc<dyn SessionRepository>,
    admin_emails: HashSet<String>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        session_repository: Arc<dyn SessionRepository>,
        admin_emails: &[String],
        session_ttl: Duration,
    ) -> Self {
        Self {
            user_repository,
            session_repository,
            admin_emails: admin_emails.iter().map(|e| normalize_email(e)).collect(),
            session_ttl,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthenticatedUser, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        if self.user_repository.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let role = if self.admin_emails.contains(&email) {
            UserRole::Admin
        } else {
            UserRole::User
        };
        let user = User::new(email.clone(), Some(PasswordHash::generate(password)), role);
        self.user_repository.create(&user).await?;

        tracing::info!("Registered {} with role {}", email, role.as_str());
        Ok(AuthenticatedUser { email, role })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let email = normalize_email(email);
        let user = self
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.verify_password(password) {
            tracing::warn!("Failed login for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            email: user.email().to_string(),
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.session_repository.create(&session).await?;

        Ok(LoginSession {
            token: session.token,
            email: session.email,
            role: user.role(),
            expires_at: session.expires_at,
        })
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let session = self
            .session_repository
            .find_valid(token, Utc::now())
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let user = self
            .user_repository
            .find_by_email(&session.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        Ok(AuthenticatedUser {
            email: user.email().to_string(),
            role: user.role(),
        })
    }

    pub async fn logout(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.session_repository.delete(token).await?)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
        && !email.contains('/')
        && !email.chars().any(char::is_whitespace);

    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(format!("Invalid email: {}", email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemorySessionRepository, InMemoryUserRepository};

    fn service(ttl: Duration) -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::default()),
            Arc::new(InMemorySessionRepository::default()),
            &["Boss@Example.com".to_string()],
            ttl,
        )
    }

    #[tokio::test]
    async fn test_register_login_authenticate() {
        let auth = service(Duration::hours(1));

        let user = auth.register(" Ann@Example.com ", "secret123").await.unwrap();
        assert_eq!(user.email, "ann@example.com");
        assert_eq!(user.role, UserRole::User);

        let session = auth.login("ann@example.com", "secret123").await.unwrap();
        let resolved = auth.authenticate(&session.token).await.unwrap();
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn test_admin_emails_get_admin_role() {
        let auth = service(Duration::hours(1));

        let user = auth.register("boss@example.com", "secret123").await.unwrap();

        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_duplicate_signup_is_rejected() {
        let auth = service(Duration::hours(1));
        auth.register("ann@example.com", "secret123").await.unwrap();

        let result = auth.register("ANN@example.com", "other-password").await;

        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user() {
        let auth = service(Duration::hours(1));
        auth.register("ann@example.com", "secret123").await.unwrap();

        assert!(matches!(
            auth.login("ann@example.com", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("bob@example.com", "secret123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_expired_and_logged_out_sessions_are_rejected() {
        let expired = service(Duration::seconds(-1));
        expired.register("ann@example.com", "secret123").await.unwrap();
        let session = expired.login("ann@example.com", "secret123").await.unwrap();
        assert!(matches!(
            expired.authenticate(&session.token).await,
            Err(AuthError::Unauthorized)
        ));

        let auth = service(Duration::hours(1));
        auth.register("ann@example.com", "secret123").await.unwrap();
        let session = auth.login("ann@example.com", "secret123").await.unwrap();
        assert!(auth.logout(&session.token).await.unwrap());
        assert!(matches!(
            auth.authenticate(&session.token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_invalid_signup_input() {
        let auth = service(Duration::hours(1));

        assert!(matches!(
            auth.register("not-an-email", "secret123").await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.register("a/b@example.com", "secret123").await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            auth.register("ann@example.com", "123").await,
            Err(AuthError::InvalidInput(_))
        ));
    }
}
