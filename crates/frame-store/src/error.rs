//! Frame store errors.

use std::path::PathBuf;

use lapse_common::error::LapseError;

#[derive(Debug, thiserror::Error)]
pub enum FrameStoreError {
    #[error("IO error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Timestamp {timestamp} does not follow {last}")]
    NonMonotonic { timestamp: String, last: String },
}

impl From<FrameStoreError> for LapseError {
    fn from(err: FrameStoreError) -> Self {
        match err {
            FrameStoreError::IoError { path, source } => LapseError::Io(std::io::Error::new(
                source.kind(),
                format!("{}: {source}", path.display()),
            )),
            FrameStoreError::NonMonotonic { timestamp, .. } => LapseError::collision(timestamp),
        }
    }
}
