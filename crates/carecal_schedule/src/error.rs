// --- File: crates/carecal_schedule/src/error.rs ---
use carecal_common::CarecalError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Malformed time or date text.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// Working hours, break window or slot settings violate their invariants.
    #[error("Invalid schedule config: {0}")]
    InvalidConfig(String),
    /// Inverted or empty date/time span, or an otherwise unusable rule.
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// A newer query from the same caller session replaced this one.
    #[error("Schedule query superseded for provider {0}")]
    Superseded(String),
    #[error("Schedule store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;

impl From<ScheduleError> for CarecalError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::InvalidFormat(msg) => CarecalError::ParseError(msg),
            ScheduleError::InvalidConfig(msg) => {
                CarecalError::ValidationError(format!("invalid config: {msg}"))
            }
            ScheduleError::InvalidRange(msg) => {
                CarecalError::ValidationError(format!("invalid range: {msg}"))
            }
            ScheduleError::NotFound(msg) => CarecalError::NotFoundError(msg),
            err @ ScheduleError::Superseded(_) => CarecalError::ConflictError(err.to_string()),
            ScheduleError::Store(msg) => CarecalError::StorageError(msg),
        }
    }
}
