use thiserror::Error;

// Import Axum types for HTTP response conversion
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// The custom error type for the application.
#[derive(Debug, Error)]
pub enum Error {
    /// An error originating from the sqlx library.
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Invalid input at an HTTP boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A not found error (resource does not exist).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A conflict error (resource already exists or was modified concurrently).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A payment gateway call failed or timed out.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// A webhook signature did not verify.
    #[error("Signature verification failed: {0}")]
    Signature(String),

    /// An outbound message could not be delivered.
    #[error("Messaging error: {0}")]
    Messaging(String),

    /// A JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// A type alias for `Result<T, Error>` to simplify function signatures.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures caused by an external dependency being unavailable.
    pub fn is_gateway(&self) -> bool {
        matches!(self, Error::Gateway(_))
    }
}

/// Convert custom Error to HTTP response
///
/// Maps each error variant to a status code and a JSON body with an error
/// message and error code. Storage and internal details are never exposed.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            Error::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT"),
            Error::Signature(_) => (
                StatusCode::UNAUTHORIZED,
                "Invalid signature".to_string(),
                "INVALID_SIGNATURE",
            ),
            Error::Gateway(_) => (
                StatusCode::BAD_GATEWAY,
                "Payment provider unavailable".to_string(),
                "GATEWAY_ERROR",
            ),
            Error::Messaging(_) => (
                StatusCode::BAD_GATEWAY,
                "Messaging provider unavailable".to_string(),
                "MESSAGING_ERROR",
            ),
            Error::Serialization(_) => (
                StatusCode::BAD_REQUEST,
                "Malformed payload".to_string(),
                "BAD_PAYLOAD",
            ),
            Error::Sqlx(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "INTERNAL_ERROR",
            ),
            Error::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
                "INTERNAL_ERROR",
            ),
            Error::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                "CONFIG_ERROR",
            ),
        };

        let body = serde_json::json!({
            "error": message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::Signature("bad".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::NotFound("order".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Gateway("timeout".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
