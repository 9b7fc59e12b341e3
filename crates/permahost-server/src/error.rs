use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use permahost_core::CoreError;
use permahost_mirror::SyncError;
use permahost_store::StoreError;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    /// Repositorio no registrado
    NotFound(String),

    /// Repositorio ya registrado
    Conflict(String),

    /// Parametros invalidos
    BadRequest(String),

    /// Error interno
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(link) => (
                StatusCode::NOT_FOUND,
                format!("Repository not found: {}", link),
            ),
            AppError::Conflict(link) => (
                StatusCode::CONFLICT,
                format!("Repository already tracked: {}", link),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            },
        };

        let body = Json(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<SyncError> for AppError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::NotFound(link) => AppError::NotFound(link),
            SyncError::AlreadyTracked(link) => AppError::Conflict(link),
            SyncError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        SyncError::from(e).into()
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}
