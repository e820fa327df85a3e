//! HTTP error responses.

use crate::error::ScraperError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Error returned by request handlers, rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A required query parameter is missing or malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The scrape produced no data.
    #[error("{0}")]
    NotFound(String),

    /// Anything else. `details` is logged and alerted, never sent to clients.
    #[error("{message}")]
    Internal { message: String, details: String },
}

impl ApiError {
    /// Maps a scraper failure to a response, using `message` as the client text.
    pub fn from_scraper(err: &ScraperError, message: &str) -> Self {
        match err {
            ScraperError::InvalidUrl(_) => ApiError::BadRequest(err.to_string()),
            ScraperError::NotFound(_) => ApiError::NotFound(message.to_string()),
            _ => ApiError::Internal {
                message: message.to_string(),
                details: format!("{:?}", err),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true if this error should be pushed to the alert channel.
    pub fn is_alertable(&self) -> bool {
        !matches!(self, ApiError::BadRequest(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
