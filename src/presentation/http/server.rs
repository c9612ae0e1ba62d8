use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::presentation::http::{
    handlers::{AuthHandler, ChatHandler, FileHandler, HistoryHandler},
    routes::{auth_routes, chat_routes, file_routes, health_routes, history_routes},
};

pub struct HttpServer {
    auth_handler: Arc<AuthHandler>,
    chat_handler: Arc<ChatHandler>,
    file_handler: Arc<FileHandler>,
    history_handler: Arc<HistoryHandler>,
    blob_dir: PathBuf,
    max_upload_bytes: usize,
    port: u16,
}

impl HttpServer {
    pub fn new(
        auth_handler: Arc<AuthHandler>,
        chat_handler: Arc<ChatHandler>,
        file_handler: Arc<FileHandler>,
        history_handler: Arc<HistoryHandler>,
        blob_dir: PathBuf,
        max_upload_bytes: usize,
        port: u16,
    ) -> Self {
        Self {
            auth_handler,
            chat_handler,
            file_handler,
            history_handler,
            blob_dir,
            max_upload_bytes,
            port,
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(health_routes())
            .merge(auth_routes(self.auth_handler.clone()))
            .merge(chat_routes(self.chat_handler.clone()))
            .merge(history_routes(self.history_handler.clone()))
            .merge(file_routes(self.file_handler.clone()))
            .nest_service("/blobs", ServeDir::new(&self.blob_dir))
            .layer(cors)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.max_upload_bytes))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(
                        |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                            tracing::info!(
                                "Received request: {} {}",
                                request.method(),
                                request.uri().path()
                            );
                        },
                    )
                    .on_response(
                        |response: &axum::http::Response<axum::body::Body>,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::info!(
                                "Response: {} (took {} ms)",
                                response.status(),
                                latency.as_millis()
                            );
                        },
                    )
                    .on_failure(
                        |error: ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                "Request failed: {:?} (took {} ms)",
                                error,
                                latency.as_millis()
                            );
                        },
                    ),
            )
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);
        axum::serve(listener, app).await?;

        Ok(())
    }
}
