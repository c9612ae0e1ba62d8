use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::AuthHandler;

pub fn auth_routes(auth_handler: Arc<AuthHandler>) -> Router {
    Router::new()
        .route("/api/auth/signup", post(AuthHandler::signup))
        .route("/api/auth/login", post(AuthHandler::login))
        .route("/api/auth/logout", post(AuthHandler::logout))
        .with_state(auth_handler)
}
