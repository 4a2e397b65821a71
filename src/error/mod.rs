use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type for intake service operations
pub type Result<T> = std::result::Result<T, IntakeError>;

/// Intake service error types
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            IntakeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::NotFound(_) => StatusCode::NOT_FOUND,
            IntakeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            IntakeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            IntakeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            IntakeError::Validation("issue must not be empty".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            IntakeError::NotFound("/nope".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            IntakeError::Storage("lock poisoned".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_error_display_is_bare_message() {
        let err = IntakeError::Validation("name must not exceed 20 characters".to_string());
        assert_eq!(err.to_string(), "name must not exceed 20 characters");
    }
}
