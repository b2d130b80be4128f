//! Lapse Capture Engine
//!
//! Periodically captures one image per connected monitor and keeps every
//! monitor directory index-aligned in time while monitors come and go.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   CaptureSession                     │
//! │                                                      │
//! │  detect ──▶ TopologySnapshot ──▶ diff_topology       │
//! │                                      │               │
//! │  scan_root ──▶ Timeline ──▶ plan_backfill            │
//! │                                      │               │
//! │                 backfill_directory ◀─┘               │
//! │                        │                             │
//! │        CaptureBackend ─┴─▶ FrameEncoder              │
//! │                                 │                    │
//! │  ┌──────────────────────────────▼──────────────────┐ │
//! │  │  <root>/screen_<W>x<H>_<X>_<Y>/<timestamp>.png  │ │
//! │  └─────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod backfill;
pub mod encoder;
pub mod session;
pub mod topology;

pub use backend::{CaptureBackend, SyntheticBackend};
pub use encoder::{FrameEncoder, PngEncoder};
pub use session::*;
pub use topology::{diff_topology, TopologyDiff, TopologySnapshot};
