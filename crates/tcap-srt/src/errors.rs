//! Error types for the SRT engine
//!
//! Correlation itself never fails: an orphan is a `None` from
//! [`CorrelationEngine::process`](crate::CorrelationEngine::process) and a
//! retransmission is flagged by [`Correlation::is_duplicate`](crate::Correlation::is_duplicate).
//! The errors here cover the surfaces around it.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias
pub type Result<T> = std::result::Result<T, SrtError>;

/// Top-level engine error
#[derive(Debug, Error)]
pub enum SrtError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown capture session: {0}")]
    UnknownCapture(Uuid),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
