//! The authoritative tick timeline.
//!
//! Holds one timestamp per capture tick. Its length is the MaxFrameCount
//! every monitor directory is backfilled to, and its entries are the names
//! filler frames borrow so that frame `N` means the same tick everywhere.

use std::ops::Range;

use crate::error::FrameStoreError;
use crate::scanner::DirectoryState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    stamps: Vec<String>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a timeline from the longest directory on disk.
    pub fn from_state(state: &DirectoryState) -> Self {
        Self {
            stamps: state.representative_timestamps(),
        }
    }

    /// Adopt the on-disk representative if it has grown past this timeline.
    /// Returns `true` if the timeline changed. Never shrinks.
    pub fn reconcile(&mut self, state: &DirectoryState) -> bool {
        if state.max_frame_count() <= self.stamps.len() {
            return false;
        }
        let stamps = state.representative_timestamps();
        tracing::info!(
            from = self.stamps.len(),
            to = stamps.len(),
            "Timeline adopted longer sequence found on disk"
        );
        self.stamps = stamps;
        true
    }

    /// Record a new tick. Timestamps must be strictly increasing.
    pub fn push(&mut self, timestamp: impl Into<String>) -> Result<(), FrameStoreError> {
        let timestamp = timestamp.into();
        if let Some(last) = self.stamps.last() {
            if timestamp <= *last {
                return Err(FrameStoreError::NonMonotonic {
                    timestamp,
                    last: last.clone(),
                });
            }
        }
        self.stamps.push(timestamp);
        Ok(())
    }

    /// Whether `timestamp` may be appended next.
    pub fn accepts(&self, timestamp: &str) -> bool {
        self.stamps.last().map_or(true, |last| timestamp > last.as_str())
    }

    /// MaxFrameCount.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Timestamps for frame indices in `range`, or `None` if the range runs
    /// past the recorded ticks.
    pub fn slice(&self, range: Range<usize>) -> Option<&[String]> {
        self.stamps.get(range)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.stamps
    }

    pub fn last(&self) -> Option<&str> {
        self.stamps.last().map(String::as_str)
    }
}

impl From<Vec<String>> for Timeline {
    fn from(stamps: Vec<String>) -> Self {
        Self { stamps }
    }
}
