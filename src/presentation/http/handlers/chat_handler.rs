use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
};
use futures::stream::{self, Stream};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::mpsc;

use crate::application::services::{
    AuthService, ChatService,
    chat_service::{ChatError, ChatEvent, ChatRequest},
};
use crate::presentation::http::auth::{CurrentUser, SessionAuth};
use crate::presentation::http::dto::{ChatRequestDto, error_response};

const EVENT_BUFFER: usize = 32;

pub struct ChatHandler {
    chat_service: Arc<ChatService>,
    auth_service: Arc<AuthService>,
}

impl SessionAuth for ChatHandler {
    fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
}

impl ChatHandler {
    pub fn new(chat_service: Arc<ChatService>, auth_service: Arc<AuthService>) -> Self {
        Self {
            chat_service,
            auth_service,
        }
    }

    /// Streams one chat turn as server-sent events. Request problems are
    /// answered with a plain status before the stream opens.
    pub async fn chat(
        State(handler): State<Arc<ChatHandler>>,
        current: CurrentUser,
        Json(body): Json<ChatRequestDto>,
    ) -> Response {
        let request = ChatRequest::from(body);
        let existing = match handler.chat_service.check_request(&current.user, &request).await {
            Ok(existing) => existing,
            Err(e) => return chat_error_response(e),
        };

        let (tx, rx) = mpsc::channel::<ChatEvent>(EVENT_BUFFER);
        let service = handler.chat_service.clone();
        let user = current.user;
        tokio::spawn(async move {
            let chat_id = request.id.clone();
            match service.run_checked_turn(&user, request, existing, tx.clone()).await {
                Ok(chat) => tracing::info!("Chat {} saved with {} messages", chat.id, chat.messages.len()),
                Err(e) => {
                    tracing::error!("Chat turn {} failed: {}", chat_id, e);
                    let _ = tx
                        .send(ChatEvent::Error {
                            message: e.to_string(),
                        })
                        .await;
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            let event = rx.recv().await?;
            let sse = Event::default()
                .event(event.name())
                .json_data(&event)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
            Some((Ok::<_, Infallible>(sse), rx))
        });

        create_sse_response(stream)
    }
}

fn chat_error_response(error: ChatError) -> Response {
    match error {
        ChatError::InvalidRequest(_) => {
            error_response(StatusCode::BAD_REQUEST, "INVALID_REQUEST", error.to_string())
        }
        ChatError::Forbidden(_) => error_response(StatusCode::FORBIDDEN, "FORBIDDEN", error.to_string()),
        _ => {
            tracing::error!("Chat request failed: {}", error);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "CHAT_FAILED",
                error.to_string(),
            )
        }
    }
}

pub fn create_sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
        .into_response()
}
