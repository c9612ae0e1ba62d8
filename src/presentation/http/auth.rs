use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::application::services::{AuthService, AuthenticatedUser, auth_service::AuthError};
use crate::presentation::http::dto::ApiResponse;

/// Handlers that can resolve a session token.
pub trait SessionAuth {
    fn auth_service(&self) -> &AuthService;
}

/// The signed-in caller, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthenticatedUser,
    pub token: String,
}

type AuthRejection = (StatusCode, Json<ApiResponse<()>>);

fn reject(status: StatusCode, code: &str, message: &str) -> AuthRejection {
    (
        status,
        Json(ApiResponse::error(code.to_string(), message.to_string(), None)),
    )
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<H> FromRequestParts<Arc<H>> for CurrentUser
where
    H: SessionAuth + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<H>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Missing session token"))?
            .to_string();

        match state.auth_service().authenticate(&token).await {
            Ok(user) => Ok(Self { user, token }),
            Err(AuthError::Unauthorized) => Err(reject(
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Session is missing or expired",
            )),
            Err(e) => {
                tracing::error!("Session lookup failed: {}", e);
                Err(reject(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SESSION_LOOKUP_FAILED",
                    "Could not verify the session",
                ))
            }
        }
    }
}
