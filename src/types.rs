//! Error taxonomy shared across the crate
//!
//! Every failure surfaces to the caller in the response envelope with
//! `success=false`; `status_code()` is the single place the taxonomy maps
//! onto HTTP.

use hyper::StatusCode;
use thiserror::Error;

/// Errors produced by Agora
#[derive(Debug, Error)]
pub enum AgoraError {
    /// Bad input shape or range, rejected before any store call
    #[error("{0}")]
    Validation(String),

    /// No live entity matched the selector
    #[error("{0} not found")]
    NotFound(String),

    /// Missing or unresolvable credential
    #[error("{0}")]
    Unauthorized(String),

    /// Resolved actor lacks the required permission level
    #[error("{0}")]
    Forbidden(String),

    /// Intentionally blocked mutation on a read-only entity
    #[error("{0} is disabled")]
    OperationDisabled(String),

    /// Store-level failure, logged at the store boundary and surfaced unchanged
    #[error("database error: {0}")]
    Database(String),

    /// Request body or upstream HTTP failure
    #[error("{0}")]
    Http(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AgoraError {
    /// Map the taxonomy onto an HTTP status for the response envelope
    pub fn status_code(&self) -> StatusCode {
        match self {
            AgoraError::Validation(_) => StatusCode::BAD_REQUEST,
            AgoraError::NotFound(_) => StatusCode::NOT_FOUND,
            AgoraError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AgoraError::Forbidden(_) => StatusCode::FORBIDDEN,
            AgoraError::OperationDisabled(_) => StatusCode::FORBIDDEN,
            AgoraError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AgoraError::Http(_) => StatusCode::BAD_REQUEST,
            AgoraError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgoraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AgoraError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AgoraError::NotFound("person".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AgoraError::Unauthorized("missing access token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AgoraError::Forbidden("admin only".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AgoraError::OperationDisabled("tool creation".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AgoraError::Database("insert failed".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = AgoraError::NotFound("Conversation".into());
        assert_eq!(err.to_string(), "Conversation not found");
    }

    #[test]
    fn test_disabled_message() {
        let err = AgoraError::OperationDisabled("Memory creation".into());
        assert_eq!(err.to_string(), "Memory creation is disabled");
    }
}
