//! Error types shared across Lapse crates.

use std::path::PathBuf;

/// Top-level error type for Lapse operations.
#[derive(Debug, thiserror::Error)]
pub enum LapseError {
    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Encode error at {path}: {message}")]
    Encode { path: PathBuf, message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    /// More filler frames were requested than the timeline has timestamps for.
    #[error(
        "Backfill exhausted for {directory}: {requested} frames requested, only {available} timestamps recorded"
    )]
    BackfillExhausted {
        directory: PathBuf,
        requested: usize,
        available: usize,
    },

    /// A frame name would reuse a timestamp that is already taken.
    #[error("Timestamp collision: {timestamp}")]
    TimestampCollision { timestamp: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using LapseError.
pub type LapseResult<T> = Result<T, LapseError>;

impl LapseError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn encode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Encode {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    pub fn collision(timestamp: impl Into<String>) -> Self {
        Self::TimestampCollision {
            timestamp: timestamp.into(),
        }
    }

    /// Whether this error only affects a single monitor for the current tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Capture { .. })
    }
}
