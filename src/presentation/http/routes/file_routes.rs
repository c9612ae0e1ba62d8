use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::FileHandler;

pub fn file_routes(file_handler: Arc<FileHandler>) -> Router {
    Router::new()
        .route("/api/files/upload", post(FileHandler::upload_file))
        .route("/api/files/list", get(FileHandler::list_files))
        .route("/api/files/delete", delete(FileHandler::delete_file))
        .with_state(file_handler)
}
