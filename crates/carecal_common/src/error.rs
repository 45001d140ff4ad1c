// --- File: crates/carecal_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type shared by all CareCal crates.
///
/// Domain crates keep their own error enums and implement
/// `From<DomainError> for CarecalError` so the HTTP layer has one type to map.
#[derive(Error, Debug)]
pub enum CarecalError {
    /// Input text could not be parsed (times, dates, JSON bodies)
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Missing or invalid application configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A request was well-formed but violated a domain rule
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A request lost a race against a newer one for the same resource
    #[error("Conflict: {0}")]
    ConflictError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    /// The backing store failed
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Maps errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for CarecalError {
    fn status_code(&self) -> u16 {
        match self {
            CarecalError::ParseError(_) => 400,
            CarecalError::ConfigError(_) => 500,
            CarecalError::ValidationError(_) => 400,
            CarecalError::ConflictError(_) => 409,
            CarecalError::NotFoundError(_) => 404,
            CarecalError::StorageError(_) => 500,
            CarecalError::InternalError(_) => 500,
        }
    }
}

impl From<serde_json::Error> for CarecalError {
    fn from(err: serde_json::Error) -> Self {
        CarecalError::ParseError(err.to_string())
    }
}

pub fn config_error<T: fmt::Display>(message: T) -> CarecalError {
    CarecalError::ConfigError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CarecalError::ValidationError("bad".into()).status_code(), 400);
        assert_eq!(CarecalError::NotFoundError("rule".into()).status_code(), 404);
        assert_eq!(CarecalError::ConflictError("x".into()).status_code(), 409);
        assert_eq!(config_error("x").status_code(), 500);
        assert_eq!(CarecalError::StorageError("x".into()).status_code(), 500);
    }

    #[test]
    fn test_json_error_is_parse_error() {
        let err: CarecalError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, CarecalError::ParseError(_)));
        assert_eq!(err.status_code(), 400);
    }
}
