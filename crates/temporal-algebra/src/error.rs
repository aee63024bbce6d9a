//! Error types for temporal-algebra operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Unsupported duration field: {0}")]
    UnsupportedDurationField(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Chronology mismatch: {left} vs {right}")]
    ChronologyMismatch { left: String, right: String },

    #[error("Invalid field value: {field}={value}")]
    InvalidField { field: String, value: i64 },

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TemporalError>;
