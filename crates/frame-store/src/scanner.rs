//! Directory state scanner.
//!
//! Rebuilds the per-monitor frame sequences from disk so a capture loop
//! can resume after an interruption. The scan is read-only.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lapse_common::clock::parse_frame_timestamp;
use lapse_platform_core::{MonitorIdentity, MONITOR_DIR_PREFIX};

use crate::error::FrameStoreError;
use crate::layout::FrameName;

/// Ordered frames of one monitor directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSequence {
    pub frames: Vec<FrameName>,
}

impl FrameSequence {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn timestamps(&self) -> Vec<String> {
        self.frames.iter().map(|f| f.timestamp.clone()).collect()
    }

    pub fn filler_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_filler()).count()
    }
}

/// Snapshot of every monitor directory under a capture root.
#[derive(Debug, Clone, Default)]
pub struct DirectoryState {
    pub root: PathBuf,
    /// Keyed by directory name, e.g. `screen_1920x1080_0_0`.
    pub directories: BTreeMap<String, FrameSequence>,
}

/// A directory that does not line up with the representative sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Misalignment {
    /// Fewer frames than the longest directory. Expected for monitors that
    /// are currently detached.
    Behind {
        directory: String,
        len: usize,
        max: usize,
    },
    /// Frame `index` carries a different timestamp than the representative.
    Diverged {
        directory: String,
        index: usize,
        expected: String,
        found: String,
    },
}

impl DirectoryState {
    /// Length of the longest frame sequence (MaxFrameCount).
    pub fn max_frame_count(&self) -> usize {
        self.directories.values().map(FrameSequence::len).max().unwrap_or(0)
    }

    /// The longest directory. Ties go to the first directory by name.
    pub fn representative(&self) -> Option<(&str, &FrameSequence)> {
        self.directories
            .iter()
            .filter(|(_, seq)| !seq.is_empty())
            .fold(None, |best: Option<(&String, &FrameSequence)>, (name, seq)| {
                match best {
                    Some((_, b)) if b.len() >= seq.len() => best,
                    _ => Some((name, seq)),
                }
            })
            .map(|(name, seq)| (name.as_str(), seq))
    }

    /// Timestamps of the representative directory, empty if none exists.
    pub fn representative_timestamps(&self) -> Vec<String> {
        self.representative()
            .map(|(_, seq)| seq.timestamps())
            .unwrap_or_default()
    }

    pub fn sequence(&self, identity: &MonitorIdentity) -> Option<&FrameSequence> {
        self.directories.get(&identity.dir_name())
    }

    /// Number of frames recorded for a monitor; zero if it has no directory.
    pub fn frame_count(&self, identity: &MonitorIdentity) -> usize {
        self.sequence(identity).map(FrameSequence::len).unwrap_or(0)
    }

    /// Compare every directory against the representative sequence.
    pub fn misalignments(&self) -> Vec<Misalignment> {
        let reference = self.representative_timestamps();
        let max = reference.len();
        let mut issues = Vec::new();

        for (name, seq) in &self.directories {
            let diverged = seq
                .frames
                .iter()
                .zip(reference.iter())
                .enumerate()
                .find(|(_, (frame, expected))| frame.timestamp != **expected);

            if let Some((index, (frame, expected))) = diverged {
                issues.push(Misalignment::Diverged {
                    directory: name.clone(),
                    index,
                    expected: expected.clone(),
                    found: frame.timestamp.clone(),
                });
            } else if seq.len() < max {
                issues.push(Misalignment::Behind {
                    directory: name.clone(),
                    len: seq.len(),
                    max,
                });
            }
        }

        issues
    }
}

/// Scan `root` for monitor directories and their frames.
///
/// A missing root is treated as empty. Files that are not complete frames
/// (partial writes, foreign files, unparseable timestamps) are ignored.
pub fn scan_root(root: &Path) -> Result<DirectoryState, FrameStoreError> {
    let mut state = DirectoryState {
        root: root.to_path_buf(),
        directories: BTreeMap::new(),
    };

    if !root.exists() {
        tracing::debug!(root = %root.display(), "Capture root does not exist yet");
        return Ok(state);
    }

    let entries = std::fs::read_dir(root).map_err(|e| FrameStoreError::IoError {
        path: root.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| FrameStoreError::IoError {
            path: root.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(MONITOR_DIR_PREFIX) {
            continue;
        }

        let sequence = scan_directory(&path)?;
        tracing::trace!(directory = name, frames = sequence.len(), "Scanned monitor directory");
        state.directories.insert(name.to_string(), sequence);
    }

    Ok(state)
}

/// Read the frames of a single monitor directory, sorted by timestamp.
pub fn scan_directory(dir: &Path) -> Result<FrameSequence, FrameStoreError> {
    let entries = std::fs::read_dir(dir).map_err(|e| FrameStoreError::IoError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut frames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FrameStoreError::IoError {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        match FrameName::parse(file_name) {
            Some(frame) if parse_frame_timestamp(&frame.timestamp).is_some() => frames.push(frame),
            _ => tracing::debug!(file = file_name, "Skipping non-frame file"),
        }
    }

    frames.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    Ok(FrameSequence { frames })
}
