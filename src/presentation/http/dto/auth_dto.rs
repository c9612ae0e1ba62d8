use serde::{Deserialize, Serialize};

use crate::application::services::AuthenticatedUser;
use crate::domain::entities::UserRole;

#[derive(Debug, Deserialize)]
pub struct CredentialsDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponseDto {
    pub email: String,
    pub role: UserRole,
}

impl From<AuthenticatedUser> for UserResponseDto {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            email: user.email,
            role: user.role,
        }
    }
}
