use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::application::services::{AuthService, auth_service::AuthError};
use crate::presentation::http::auth::{CurrentUser, SessionAuth};
use crate::presentation::http::dto::{
    ApiResponse, CredentialsDto, MessageResponseDto, UserResponseDto, error_response,
};

pub struct AuthHandler {
    auth_service: Arc<AuthService>,
}

impl SessionAuth for AuthHandler {
    fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
}

impl AuthHandler {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self { auth_service }
    }

    pub async fn signup(
        State(handler): State<Arc<AuthHandler>>,
        Json(credentials): Json<CredentialsDto>,
    ) -> Response {
        match handler
            .auth_service
            .register(&credentials.email, &credentials.password)
            .await
        {
            Ok(user) => (
                StatusCode::CREATED,
                Json(ApiResponse::success(UserResponseDto::from(user))),
            )
                .into_response(),
            Err(e) => auth_error_response(e),
        }
    }

    pub async fn login(
        State(handler): State<Arc<AuthHandler>>,
        Json(credentials): Json<CredentialsDto>,
    ) -> Response {
        match handler
            .auth_service
            .login(&credentials.email, &credentials.password)
            .await
        {
            Ok(session) => (StatusCode::OK, Json(ApiResponse::success(session))).into_response(),
            Err(e) => auth_error_response(e),
        }
    }

    pub async fn logout(
        State(handler): State<Arc<AuthHandler>>,
        current: CurrentUser,
    ) -> Response {
        match handler.auth_service.logout(&current.token).await {
            Ok(_) => (
                StatusCode::OK,
                Json(ApiResponse::success(MessageResponseDto {
                    message: "Signed out".to_string(),
                })),
            )
                .into_response(),
            Err(e) => auth_error_response(e),
        }
    }
}

fn auth_error_response(error: AuthError) -> Response {
    match error {
        AuthError::EmailTaken => error_response(StatusCode::CONFLICT, "EMAIL_TAKEN", error.to_string()),
        AuthError::InvalidInput(_) => {
            error_response(StatusCode::BAD_REQUEST, "INVALID_INPUT", error.to_string())
        }
        AuthError::InvalidCredentials | AuthError::Unauthorized => {
            error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", error.to_string())
        }
        AuthError::Repository(_) => {
            tracing::error!("Auth request failed: {}", error);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_FAILED",
                "Authentication service unavailable",
            )
        }
    }
}
