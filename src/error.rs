use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use crate::sentiment::ScorerError;

/// Failure of a request. Converted into a JSON `{error, type}` body at the
/// handler boundary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    /// Body that could not be read or deserialized into the request type.
    #[error("Invalid request body: {message}")]
    InvalidBody { message: String, status: StatusCode },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Sentiment analysis failed: {0}")]
    Scorer(#[from] ScorerError),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "ValidationError",
            ServiceError::InvalidBody { .. } => "InvalidBodyError",
            ServiceError::Database(_) => "DatabaseError",
            ServiceError::Scorer(_) => "ScorerError",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(rename = "type")]
    kind: &'a str,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidBody { status, .. } => *status,
            ServiceError::Database(_) | ServiceError::Scorer(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!("[API] Request failed: {}", self);
        } else {
            tracing::warn!("[API] Request rejected: {}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        })
    }
}
