use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt::Display;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures surfaced to HTTP clients, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Remote datasets failed to load at startup; lasts until restart.
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    RegionNotFound(String),
    #[error("{0}")]
    RemoteOperation(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ServiceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RegionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RemoteOperation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Logs a failed remote call and wraps it for the client.
pub fn remote_failure(context: &str, err: impl Display) -> AppError {
    tracing::error!(error = %err, "{context}");
    AppError::RemoteOperation(format!("{context}: {err}. Check server logs."))
}
