use crate::model::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;
use wormhole_core::StorageError;
use wormhole_redirector::RedirectorError;
use wormhole_shortener::{ShortenerError, ValidationError};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
    #[error(transparent)]
    Redirector(#[from] RedirectorError),
    #[error("stored url cannot be used as a redirect target")]
    InvalidTarget,
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::Shortener(error.into())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Shortener(error) => match error {
                ShortenerError::Validation(_)
                | ShortenerError::UrlTooLong { .. }
                | ShortenerError::DecodeInvalid(_) => StatusCode::BAD_REQUEST,
                ShortenerError::Blocked => StatusCode::FORBIDDEN,
                ShortenerError::NotFound => StatusCode::NOT_FOUND,
                ShortenerError::Deleted(_) => StatusCode::GONE,
                ShortenerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                ShortenerError::ReadOnly => StatusCode::SERVICE_UNAVAILABLE,
                ShortenerError::Storage(error) => storage_status(error),
            },
            AppError::Redirector(RedirectorError::Storage(error)) => storage_status(error),
            AppError::InvalidTarget => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Shortener(error) => error.kind(),
            AppError::Redirector(_) => "storage",
            AppError::InvalidTarget => "invalid_target",
        }
    }
}

fn storage_status(error: &StorageError) -> StatusCode {
    match error {
        StorageError::Unavailable(_) | StorageError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
