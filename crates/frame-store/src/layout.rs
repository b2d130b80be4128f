//! Directory and frame file naming.

use std::path::{Path, PathBuf};

use lapse_platform_core::MonitorIdentity;
use serde::{Deserialize, Serialize};

/// Extension of every complete frame file.
pub const FRAME_EXTENSION: &str = "png";

/// Marker appended to the stem of synthetic frames.
pub const FILLER_SUFFIX: &str = "_filler";

/// Extension appended while a frame is still being written.
pub const PARTIAL_EXTENSION: &str = "part";

/// Whether a frame was captured or synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    Real,
    Filler,
}

/// A frame file name split into its timestamp and kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameName {
    pub timestamp: String,
    pub kind: FrameKind,
}

impl FrameName {
    pub fn real(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            kind: FrameKind::Real,
        }
    }

    pub fn filler(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            kind: FrameKind::Filler,
        }
    }

    /// File name on disk, e.g. `2026-01-01_00-00-00-000_filler.png`.
    pub fn file_name(&self) -> String {
        match self.kind {
            FrameKind::Real => format!("{}.{FRAME_EXTENSION}", self.timestamp),
            FrameKind::Filler => format!("{}{FILLER_SUFFIX}.{FRAME_EXTENSION}", self.timestamp),
        }
    }

    /// Parse a complete frame file name. Partial writes and foreign files
    /// yield `None`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(&format!(".{FRAME_EXTENSION}"))?;
        if stem.is_empty() {
            return None;
        }
        match stem.strip_suffix(FILLER_SUFFIX) {
            Some(timestamp) if !timestamp.is_empty() => Some(Self::filler(timestamp)),
            Some(_) => None,
            None => Some(Self::real(stem)),
        }
    }

    pub fn is_filler(&self) -> bool {
        self.kind == FrameKind::Filler
    }
}

/// Directory holding the frames of one monitor.
pub fn monitor_dir(root: &Path, identity: &MonitorIdentity) -> PathBuf {
    root.join(identity.dir_name())
}

/// Full path of a frame inside a monitor directory.
pub fn frame_path(dir: &Path, name: &FrameName) -> PathBuf {
    dir.join(name.file_name())
}

/// Path a frame is written to before being renamed into place.
pub fn partial_path(final_path: &Path) -> PathBuf {
    let mut os = final_path.as_os_str().to_owned();
    os.push(".");
    os.push(PARTIAL_EXTENSION);
    PathBuf::from(os)
}

/// Whether a frame for `timestamp` already exists in `dir`, real or filler.
pub fn timestamp_taken(dir: &Path, timestamp: &str) -> bool {
    frame_path(dir, &FrameName::real(timestamp)).exists()
        || frame_path(dir, &FrameName::filler(timestamp)).exists()
}
