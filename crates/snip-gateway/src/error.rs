use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use snip_core::ShortenerError;
use thiserror::Error;
use tracing::error;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
    #[error("{0}")]
    Internal(String),
    #[error("failed to sign identity token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: message }),
            )
                .into_response(),
            AppError::Shortener(ShortenerError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "URL not found").into_response()
            }
            AppError::Shortener(ShortenerError::Deleted(_)) => StatusCode::GONE.into_response(),
            err => {
                error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
