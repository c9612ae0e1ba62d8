use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::application::services::AuthService;
use crate::application::use_cases::{
    DeleteDocumentUseCase, ListDocumentsUseCase, UploadDocumentUseCase,
    delete_document::{DeleteDocumentError, DeleteDocumentRequest},
    upload_document::{UploadDocumentError, UploadDocumentRequest},
};
use crate::presentation::http::auth::{CurrentUser, SessionAuth};
use crate::presentation::http::dto::{
    ApiResponse, DeleteQueryDto, FileResponseDto, UploadErrorDto, UploadQueryDto, error_response,
};

pub struct FileHandler {
    upload_use_case: Arc<UploadDocumentUseCase>,
    list_use_case: Arc<ListDocumentsUseCase>,
    delete_use_case: Arc<DeleteDocumentUseCase>,
    auth_service: Arc<AuthService>,
}

impl SessionAuth for FileHandler {
    fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
}

impl FileHandler {
    pub fn new(
        upload_use_case: Arc<UploadDocumentUseCase>,
        list_use_case: Arc<ListDocumentsUseCase>,
        delete_use_case: Arc<DeleteDocumentUseCase>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self {
            upload_use_case,
            list_use_case,
            delete_use_case,
            auth_service,
        }
    }

    /// Raw request body, filename in the query string. 200 when indexed, 202
    /// when only the blob could be stored.
    pub async fn upload_file(
        State(handler): State<Arc<FileHandler>>,
        current: CurrentUser,
        Query(query): Query<UploadQueryDto>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let request = UploadDocumentRequest {
            owner_email: current.user.email,
            filename: query.filename,
            content_type,
            data: body.to_vec(),
        };

        match handler.upload_use_case.execute(request).await {
            Ok(outcome) => {
                let status = if outcome.is_indexed() {
                    StatusCode::OK
                } else {
                    StatusCode::ACCEPTED
                };
                (status, Json(outcome)).into_response()
            }
            Err(e @ UploadDocumentError::ValidationError(_)) => {
                (StatusCode::BAD_REQUEST, Json(UploadErrorDto::new(e.to_string()))).into_response()
            }
            Err(e) => {
                tracing::error!("Upload failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(UploadErrorDto::new(e.to_string())),
                )
                    .into_response()
            }
        }
    }

    pub async fn list_files(
        State(handler): State<Arc<FileHandler>>,
        current: CurrentUser,
    ) -> Response {
        match handler.list_use_case.execute(&current.user.email).await {
            Ok(documents) => {
                let files: Vec<FileResponseDto> =
                    documents.into_iter().map(FileResponseDto::from).collect();
                (StatusCode::OK, Json(ApiResponse::success(files))).into_response()
            }
            Err(e) => {
                tracing::error!("Listing files for {} failed: {}", current.user.email, e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "LIST_FAILED", e.to_string())
            }
        }
    }

    /// Owner or admin only. The body is the vector deletion outcome; a
    /// partial vector failure still removes the blob and answers 500.
    pub async fn delete_file(
        State(handler): State<Arc<FileHandler>>,
        current: CurrentUser,
        Query(query): Query<DeleteQueryDto>,
    ) -> Response {
        let Some(file_url) = query.fileurl.filter(|url| !url.trim().is_empty()) else {
            return error_response(
                StatusCode::BAD_REQUEST,
                "MISSING_FILE_URL",
                "fileurl query parameter is required",
            );
        };

        let request = DeleteDocumentRequest {
            requester: current.user,
            file_url,
        };

        match handler.delete_use_case.execute(request).await {
            Ok(outcome) => {
                let status = if outcome.is_success() {
                    StatusCode::OK
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, Json(outcome)).into_response()
            }
            Err(e @ DeleteDocumentError::ValidationError(_)) => {
                error_response(StatusCode::BAD_REQUEST, "INVALID_FILE_URL", e.to_string())
            }
            Err(e @ DeleteDocumentError::Forbidden(_)) => {
                error_response(StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string())
            }
            Err(e) => {
                tracing::error!("Delete failed: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "DELETE_FAILED", e.to_string())
            }
        }
    }
}
