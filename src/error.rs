//! Error types for Peerpool operations

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum PeerpoolError {
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PeerpoolError>;

impl PeerpoolError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PeerpoolError::Validation(_) => StatusCode::BAD_REQUEST,
            PeerpoolError::NotFound(_) => StatusCode::NOT_FOUND,
            PeerpoolError::Forbidden(_) => StatusCode::FORBIDDEN,
            PeerpoolError::Unauthenticated => StatusCode::UNAUTHORIZED,
            PeerpoolError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for PeerpoolError {
    fn into_response(self) -> Response {
        let message = match &self {
            PeerpoolError::Internal(e) => {
                error!(error = ?e, "internal error");
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(ErrorResponse { error: message })).into_response()
    }
}
