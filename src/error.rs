//! Error types for Neurascreen
//!
//! Scoring itself is infallible: `analyze` and `combine` always return a
//! fully-formed, clamped result. These variants cover the fallible edges of
//! the crate: parsing recorded sessions, calibration handling, and report
//! encoding.

use thiserror::Error;

/// Errors that can occur at the crate's fallible edges
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Failed to parse recorded session: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported schema version: {0}")]
    UnsupportedVersion(String),

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Invalid session data: {0}")]
    InvalidSession(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
