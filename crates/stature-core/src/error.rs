//! Error types for Stature
//!
//! Failures fall into three classes. Missing state (no store file, no row for
//! a session) is not an error at all and surfaces as `None`. Malformed state
//! aborts the current observation. An unavailable collaborator ends the
//! session without retry.

use thiserror::Error;

/// Core Stature errors
#[derive(Error, Debug)]
pub enum StatureError {
    // Malformed state
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("Wrong column count on line {line}: expected {expected}, got {actual}")]
    ColumnCount {
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Collaborator unavailable
    #[error("Sensor not available")]
    SensorUnavailable,

    #[error("Observer service closed")]
    ServiceClosed,

    // Storage
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl StatureError {
    /// True for errors that only abort the current observation
    pub fn is_malformed_state(&self) -> bool {
        matches!(
            self,
            StatureError::MalformedRecord { .. }
                | StatureError::ColumnCount { .. }
                | StatureError::Csv(_)
        )
    }

    /// True for errors that end the session
    pub fn is_collaborator_unavailable(&self) -> bool {
        matches!(
            self,
            StatureError::SensorUnavailable | StatureError::ServiceClosed
        )
    }
}

/// Result type for Stature operations
pub type StatureResult<T> = Result<T, StatureError>;
