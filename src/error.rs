/// Unified error types for Gist Exposed
use crate::db::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum GistError {
    /// Persistent store errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Missing gist, file or other record
    #[error("Not found: {0}")]
    NotFound(String),

    /// No user record for the given id
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// GitHub API or identity provider failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A single gist file could not be transferred
    #[error("Download error: {url}: {reason}")]
    Download { url: String, reason: String },

    /// OAuth state parameter did not match the session
    #[error("Auth state mismatch")]
    StateMismatch,

    /// Request path cannot be routed to a gist
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Malformed request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Endpoint variant that is not supported
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl GistError {
    pub fn download(url: impl Into<String>, reason: impl ToString) -> Self {
        GistError::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convert GistError to HTTP response
impl IntoResponse for GistError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            GistError::NotFound(_) | GistError::UserNotFound(_) | GistError::InvalidPath(_) => {
                (StatusCode::NOT_FOUND, "NotFound", self.to_string())
            }
            GistError::StateMismatch => (
                StatusCode::BAD_REQUEST,
                "StateMismatch",
                "auth state mismatch".to_string(),
            ),
            GistError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "InvalidRequest", self.to_string())
            }
            GistError::NotImplemented(_) => (
                StatusCode::NOT_IMPLEMENTED,
                "NotImplemented",
                self.to_string(),
            ),
            GistError::Upstream(_) | GistError::Download { .. } => (
                StatusCode::BAD_GATEWAY,
                "UpstreamError",
                self.to_string(),
            ),
            GistError::Database(_)
            | GistError::Internal(_)
            | GistError::Io(_)
            | GistError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type GistResult<T> = Result<T, GistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (GistError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (GistError::UserNotFound(1), StatusCode::NOT_FOUND),
            (GistError::InvalidPath("/".into()), StatusCode::NOT_FOUND),
            (GistError::StateMismatch, StatusCode::BAD_REQUEST),
            (GistError::BadRequest("url".into()), StatusCode::BAD_REQUEST),
            (GistError::NotImplemented("xml".into()), StatusCode::NOT_IMPLEMENTED),
            (GistError::Upstream("boom".into()), StatusCode::BAD_GATEWAY),
            (GistError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_download_error_message() {
        let err = GistError::download("http://raw/a.js", "invalid HTTP status: 500");
        assert_eq!(
            err.to_string(),
            "Download error: http://raw/a.js: invalid HTTP status: 500"
        );
    }
}
