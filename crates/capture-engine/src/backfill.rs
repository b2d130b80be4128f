//! Filler frame generation.
//!
//! Every monitor directory must hold exactly one frame per recorded tick
//! before a new real frame is appended. Monitors that were absent (or whose
//! capture failed) get flat black frames named after the ticks they missed,
//! using the timeline's timestamps rather than the time of backfill.

use std::path::Path;

use lapse_common::error::{LapseError, LapseResult};
use lapse_frame_store::{frame_path, timestamp_taken, DirectoryState, FrameName, Timeline};
use lapse_platform_core::MonitorIdentity;

use crate::encoder::{filler_frame, FrameEncoder};
use crate::topology::{TopologyDiff, TopologySnapshot};

/// Why a directory is being backfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillReason {
    /// The monitor disappeared this tick.
    Removed,
    /// The monitor appeared this tick (new, or back after an absence).
    Added,
    /// The monitor stayed present but missed a frame, e.g. a failed capture.
    Lagging,
}

/// One directory that needs filler frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillTask {
    pub identity: MonitorIdentity,
    pub reason: BackfillReason,
    /// Frames already in the directory.
    pub have: usize,
    /// Frames the directory must hold afterwards.
    pub target: usize,
}

impl BackfillTask {
    pub fn missing(&self) -> usize {
        self.target.saturating_sub(self.have)
    }
}

/// Work out which directories must be backfilled to `max_frame_count`.
///
/// Removed monitors come first, then present monitors in identity order.
/// Directories that are already complete produce no task.
pub fn plan_backfill(
    diff: &TopologyDiff,
    current: &TopologySnapshot,
    state: &DirectoryState,
    max_frame_count: usize,
) -> Vec<BackfillTask> {
    let removed = diff.removed.iter().map(|id| (*id, BackfillReason::Removed));
    let present = current.records().map(|record| {
        let reason = if diff.added.contains(&record.identity) {
            BackfillReason::Added
        } else {
            BackfillReason::Lagging
        };
        (record.identity, reason)
    });

    removed
        .chain(present)
        .filter_map(|(identity, reason)| {
            let have = state.frame_count(&identity);
            (have < max_frame_count).then_some(BackfillTask {
                identity,
                reason,
                have,
                target: max_frame_count,
            })
        })
        .collect()
}

/// Write `target - have` filler frames into `dir`, sized to `identity`'s
/// geometry and named after `timeline[have..target]`.
///
/// Fails without writing anything if the timeline does not cover the range
/// or if any destination timestamp is already taken. Returns the number of
/// frames written.
pub fn backfill_directory(
    dir: &Path,
    identity: &MonitorIdentity,
    have: usize,
    target: usize,
    timeline: &Timeline,
    encoder: &dyn FrameEncoder,
) -> LapseResult<usize> {
    if target <= have {
        return Ok(0);
    }

    let stamps = timeline
        .slice(have..target)
        .ok_or_else(|| LapseError::BackfillExhausted {
            directory: dir.to_path_buf(),
            requested: target - have,
            available: timeline.len().saturating_sub(have),
        })?;

    if let Some(taken) = stamps.iter().find(|stamp| timestamp_taken(dir, stamp)) {
        return Err(LapseError::collision(taken.clone()));
    }

    std::fs::create_dir_all(dir)?;
    let frame = filler_frame(identity.width, identity.height);

    for (written, stamp) in stamps.iter().enumerate() {
        let path = frame_path(dir, &FrameName::filler(stamp.clone()));
        if let Err(e) = encoder.encode(&frame, &path) {
            tracing::error!(
                directory = %dir.display(),
                written,
                error = %e,
                "Backfill interrupted"
            );
            return Err(e);
        }
    }

    tracing::info!(
        monitor = %identity,
        frames = stamps.len(),
        from = have,
        to = target,
        "Backfilled filler frames"
    );
    Ok(stamps.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::PngEncoder;
    use lapse_frame_store::{scan_directory, FrameSequence};
    use lapse_platform_core::MonitorInfo;

    fn stamps(n: usize) -> Timeline {
        Timeline::from(
            (0..n)
                .map(|i| format!("2026-01-01_00-00-{i:02}-000"))
                .collect::<Vec<_>>(),
        )
    }

    fn identity(width: u32, height: u32, x: i32, y: i32) -> MonitorIdentity {
        MonitorIdentity {
            width,
            height,
            x,
            y,
        }
    }

    fn info(id: &MonitorIdentity) -> MonitorInfo {
        MonitorInfo {
            name: id.dir_name(),
            width: id.width,
            height: id.height,
            x: id.x,
            y: id.y,
            primary: false,
        }
    }

    fn state_with_counts(counts: &[(MonitorIdentity, usize)]) -> DirectoryState {
        let timeline = stamps(16);
        let mut state = DirectoryState::default();
        for (id, n) in counts {
            state.directories.insert(
                id.dir_name(),
                FrameSequence {
                    frames: timeline.as_slice()[..*n]
                        .iter()
                        .map(|s| FrameName::real(s.clone()))
                        .collect(),
                },
            );
        }
        state
    }

    #[test]
    fn new_directory_gets_one_filler_per_recorded_tick() {
        let tmp = tempfile::tempdir().unwrap();
        let id = identity(8, 4, 1920, 0);
        let dir = tmp.path().join(id.dir_name());

        let written = backfill_directory(&dir, &id, 0, 4, &stamps(4), &PngEncoder).unwrap();
        assert_eq!(written, 4);

        let seq = scan_directory(&dir).unwrap();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.filler_count(), 4);
        assert_eq!(seq.timestamps(), stamps(4).as_slice());

        let img = image::open(dir.join("2026-01-01_00-00-00-000_filler.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(img.dimensions(), (8, 4));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn partial_directory_continues_from_its_length() {
        let tmp = tempfile::tempdir().unwrap();
        let id = identity(2, 2, 0, 0);
        let dir = tmp.path().join(id.dir_name());
        let timeline = stamps(5);

        backfill_directory(&dir, &id, 0, 2, &timeline, &PngEncoder).unwrap();
        backfill_directory(&dir, &id, 2, 5, &timeline, &PngEncoder).unwrap();

        assert_eq!(scan_directory(&dir).unwrap().timestamps(), timeline.as_slice());
    }

    #[test]
    fn nothing_to_do_when_already_complete() {
        let tmp = tempfile::tempdir().unwrap();
        let id = identity(2, 2, 0, 0);
        let dir = tmp.path().join(id.dir_name());
        assert_eq!(
            backfill_directory(&dir, &id, 3, 3, &stamps(3), &PngEncoder).unwrap(),
            0
        );
        assert_eq!(
            backfill_directory(&dir, &id, 0, 0, &Timeline::new(), &PngEncoder).unwrap(),
            0
        );
        assert!(!dir.exists());
    }

    #[test]
    fn requesting_past_the_timeline_is_a_hard_error() {
        let tmp = tempfile::tempdir().unwrap();
        let id = identity(2, 2, 0, 0);
        let dir = tmp.path().join(id.dir_name());

        let err = backfill_directory(&dir, &id, 0, 5, &stamps(3), &PngEncoder).unwrap_err();
        match err {
            LapseError::BackfillExhausted {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.exists());
    }

    #[test]
    fn existing_timestamp_is_never_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let id = identity(2, 2, 0, 0);
        let dir = tmp.path().join(id.dir_name());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("2026-01-01_00-00-01-000.png"), b"real").unwrap();

        let err = backfill_directory(&dir, &id, 0, 2, &stamps(2), &PngEncoder).unwrap_err();
        assert!(matches!(err, LapseError::TimestampCollision { .. }));
        assert_eq!(
            std::fs::read(dir.join("2026-01-01_00-00-01-000.png")).unwrap(),
            b"real"
        );
        assert!(!dir.join("2026-01-01_00-00-00-000_filler.png").exists());
    }

    #[test]
    fn plan_covers_removed_added_and_lagging() {
        let main = identity(1920, 1080, 0, 0);
        let side = identity(1280, 720, 1920, 0);
        let gone = identity(800, 600, 0, 1080);

        let previous = TopologySnapshot::from_monitors(&[info(&main), info(&gone)]);
        let current = TopologySnapshot::from_monitors(&[info(&main), info(&side)]);
        let diff = crate::topology::diff_topology(&previous, &current);
        let state = state_with_counts(&[(main, 3), (gone, 2)]);

        let plan = plan_backfill(&diff, &current, &state, 4);
        assert_eq!(
            plan,
            vec![
                BackfillTask {
                    identity: gone,
                    reason: BackfillReason::Removed,
                    have: 2,
                    target: 4,
                },
                BackfillTask {
                    identity: side,
                    reason: BackfillReason::Added,
                    have: 0,
                    target: 4,
                },
                BackfillTask {
                    identity: main,
                    reason: BackfillReason::Lagging,
                    have: 3,
                    target: 4,
                },
            ]
        );
        assert_eq!(plan[0].missing(), 2);
    }

    #[test]
    fn plan_is_empty_on_first_tick() {
        let main = identity(1920, 1080, 0, 0);
        let current = TopologySnapshot::from_monitors(&[info(&main)]);
        let diff = crate::topology::diff_topology(&TopologySnapshot::empty(), &current);
        assert!(plan_backfill(&diff, &current, &DirectoryState::default(), 0).is_empty());
    }
}
