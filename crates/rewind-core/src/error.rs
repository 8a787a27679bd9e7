//! Error types for rewind-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("State already recorded at timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: f64 },

    #[error("Timestamp must be finite, got {0}")]
    NonFiniteTimestamp(f64),

    #[error("State at {timestamp} is older than the full history (oldest {oldest})")]
    TooOld { timestamp: f64, oldest: f64 },

    #[error("Timestamp {timestamp} is outside {}", Self::format_range(.range))]
    OutOfRange {
        timestamp: f64,
        /// `(oldest, newest)` of the history, `None` when it held fewer than two states
        range: Option<(f64, f64)>,
    },
}

impl Error {
    fn format_range(range: &Option<(f64, f64)>) -> String {
        match range {
            Some((oldest, newest)) => format!("recorded history [{}, {}]", oldest, newest),
            None => "recorded history (fewer than two states)".to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
