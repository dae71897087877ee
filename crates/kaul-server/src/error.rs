//! Error types for the API server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kaul_core::KaulError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned when a listing cannot be produced.
pub const READ_FAILED_MESSAGE: &str = "Failed to read data";

/// Message returned when a vote fails for a reason other than validation.
pub const VOTE_FAILED_MESSAGE: &str = "Failed to record vote";

/// Errors that can occur in the API server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// Malformed request body.
    #[error("{0}")]
    InvalidRequest(String),

    /// Vote submission failed.
    #[error(transparent)]
    Vote(KaulError),

    /// Listing failed.
    #[error("listing failed: {0}")]
    Listing(KaulError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl ApiError {
    /// HTTP status and client-facing message for this error.
    #[must_use]
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Vote(e) if e.is_validation() => (StatusCode::BAD_REQUEST, e.to_string()),
            Self::Vote(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                VOTE_FAILED_MESSAGE.to_string(),
            ),
            Self::Listing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                READ_FAILED_MESSAGE.to_string(),
            ),
            Self::BindFailed(_, _) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            success: false,
            error: message,
        };
        (status, Json(body)).into_response()
    }
}
