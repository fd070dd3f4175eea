use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::medium::fetch::FetchError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    ValidationError(#[from] crate::validation::ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Post not found")]
    NotFound,

    #[error(transparent)]
    ImportError(#[from] ImportError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Failed to encode stored field: {0}")]
    EncodingError(#[from] serde_json::Error),

    #[error("Internal server error")]
    InternalError,
}

/// Failures of the Medium import pipeline. None of them are retried.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to parse HTML: {0}")]
    Parse(String),

    #[error("Failed to store imported post: {0}")]
    Persistence(String),
}

impl ImportError {
    /// Debug rendering plus the `source()` chain, reported as `details`.
    pub fn details(&self) -> String {
        let mut details = format!("{self:?}");
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            details.push_str("\ncaused by: ");
            details.push_str(&cause.to_string());
            source = cause.source();
        }
        details
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::ValidationError(ref err) => {
                (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
            }
            ApiError::BadRequest(ref message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            ApiError::ImportError(ref err) => {
                let details = err.details();
                error!(error = %err, details = %details, "Medium import failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": err.to_string(), "details": details }),
                )
            }
            ApiError::DatabaseError(ref err) => {
                // Log the detailed error but don't expose it to the client
                error!(error = %err, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            ApiError::EncodingError(ref err) => {
                error!(error = %err, "Failed to encode stored field");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            ApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
