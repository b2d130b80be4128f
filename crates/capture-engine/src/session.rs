//! Capture session: the periodic tick loop.
//!
//! Each tick resolves the monitor topology, diffs it against the previous
//! tick, backfills directories that fell behind, captures one real frame
//! per present monitor, and finally records the tick on the timeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lapse_common::clock::{format_frame_timestamp, Clock};
use lapse_common::config::AppConfig;
use lapse_common::error::{LapseError, LapseResult};
use lapse_common::shutdown::ShutdownSignal;
use lapse_frame_store::{frame_path, monitor_dir, scan_root, FrameName, Timeline};
use lapse_platform_core::MonitorIdentity;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::backend::CaptureBackend;
use crate::backfill::{backfill_directory, plan_backfill, BackfillReason};
use crate::encoder::FrameEncoder;
use crate::topology::{diff_topology, TopologyDiff, TopologySnapshot};

/// Configuration for a capture session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory holding one subdirectory per monitor.
    pub root_dir: PathBuf,

    /// Time from the start of one tick to the start of the next.
    pub interval: Duration,

    /// Upper bound on concurrent monitor captures within a tick.
    pub max_parallel_captures: usize,

    /// Stop after this many ticks. `None` runs until shutdown.
    pub max_ticks: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl SessionConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            root_dir: config.root_dir.clone(),
            interval: config.capture.interval(),
            max_parallel_captures: config.capture.max_parallel_captures,
            max_ticks: None,
        }
    }
}

/// State of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Between ticks.
    Idle,
    /// A tick is in progress.
    Capturing,
    /// The loop has ended.
    Stopped,
}

/// Something that went wrong for one monitor during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorFailure {
    pub identity: MonitorIdentity,
    pub stage: FailureStage,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Backfill,
    Capture,
    Write,
}

/// Outcome of a single tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Zero-based tick number within this session.
    pub tick: u64,
    /// Timestamp shared by every frame of this tick.
    pub timestamp: String,
    pub diff: TopologyDiff,
    pub fillers_written: usize,
    pub frames_captured: usize,
    pub failures: Vec<MonitorFailure>,
    /// MaxFrameCount after the tick.
    pub max_frame_count: usize,
    /// The tick was cut short by a shutdown request.
    pub interrupted: bool,
}

/// A capture session that owns all synchronization state.
pub struct CaptureSession {
    config: SessionConfig,
    backend: Arc<dyn CaptureBackend>,
    encoder: Arc<dyn FrameEncoder>,
    clock: Arc<dyn Clock>,
    state: SessionState,
    previous: TopologySnapshot,
    timeline: Timeline,
    ticks: u64,
    resumed: bool,
    shutdown: ShutdownSignal,
}

impl CaptureSession {
    pub fn new(
        config: SessionConfig,
        backend: Arc<dyn CaptureBackend>,
        encoder: Arc<dyn FrameEncoder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            backend,
            encoder,
            clock,
            state: SessionState::Idle,
            previous: TopologySnapshot::empty(),
            timeline: Timeline::new(),
            ticks: 0,
            resumed: false,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Use an externally owned shutdown signal.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// MaxFrameCount.
    pub fn max_frame_count(&self) -> usize {
        self.timeline.len()
    }

    /// The topology retained from the last completed tick.
    pub fn previous_topology(&self) -> &TopologySnapshot {
        &self.previous
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Rebuild the timeline from whatever is already on disk. Called
    /// automatically before the first tick. Returns MaxFrameCount.
    pub fn resume(&mut self) -> LapseResult<usize> {
        let state = scan_root(&self.config.root_dir)?;
        self.timeline = Timeline::from_state(&state);
        self.previous = TopologySnapshot::empty();
        self.resumed = true;

        tracing::info!(
            root = %self.config.root_dir.display(),
            directories = state.directories.len(),
            max_frame_count = self.timeline.len(),
            "Recovered capture state"
        );
        Ok(self.timeline.len())
    }

    /// Run ticks until shutdown is requested or `max_ticks` is reached.
    /// Returns the number of ticks completed.
    pub async fn run(&mut self) -> LapseResult<u64> {
        if !self.resumed {
            self.resume()?;
        }

        tracing::info!(
            backend = self.backend.name(),
            interval_secs = self.config.interval.as_secs_f64(),
            "Capture loop started"
        );

        while !self.shutdown.is_triggered() && !self.reached_tick_limit() {
            let started = Instant::now();

            match self.run_tick().await {
                Ok(report) => log_report(&report),
                Err(e) => tracing::error!(error = %e, "Tick failed"),
            }

            if self.shutdown.is_triggered() || self.reached_tick_limit() {
                break;
            }

            let remaining = self.config.interval.saturating_sub(started.elapsed());
            if !self.shutdown.sleep(remaining).await {
                break;
            }
        }

        self.state = SessionState::Stopped;
        tracing::info!(
            ticks = self.ticks,
            max_frame_count = self.timeline.len(),
            "Capture loop stopped"
        );
        Ok(self.ticks)
    }

    /// Perform one full tick.
    ///
    /// Errors are returned only for failures that affect the whole tick
    /// (monitor detection, scanning the root, a clashing timestamp). In that
    /// case nothing is written and the timeline is left unchanged.
    /// Per-monitor failures are collected in the report instead.
    pub async fn run_tick(&mut self) -> LapseResult<TickReport> {
        if !self.resumed {
            self.resume()?;
        }

        self.state = SessionState::Capturing;
        let result = self.tick_inner().await;
        self.state = if self.shutdown.is_triggered() {
            SessionState::Stopped
        } else {
            SessionState::Idle
        };
        result
    }

    async fn tick_inner(&mut self) -> LapseResult<TickReport> {
        let timestamp = format_frame_timestamp(&self.clock.now());
        if !self.timeline.accepts(&timestamp) {
            return Err(LapseError::collision(timestamp));
        }

        let backend = self.backend.clone();
        let monitors = tokio::task::spawn_blocking(move || backend.detect_monitors())
            .await
            .map_err(|e| LapseError::capture(format!("Monitor detection task failed: {e}")))??;
        let current = TopologySnapshot::from_monitors(&monitors);

        let disk = scan_root(&self.config.root_dir)?;
        self.timeline.reconcile(&disk);
        if !self.timeline.accepts(&timestamp) {
            return Err(LapseError::collision(timestamp));
        }

        let diff = diff_topology(&self.previous, &current);
        if !diff.is_quiescent() {
            tracing::info!(
                added = diff.added.len(),
                removed = diff.removed.len(),
                unchanged = diff.unchanged.len(),
                "Monitor topology changed"
            );
        }

        let mut report = TickReport {
            tick: self.ticks,
            timestamp: timestamp.clone(),
            diff: diff.clone(),
            fillers_written: 0,
            frames_captured: 0,
            failures: Vec::new(),
            max_frame_count: self.timeline.len(),
            interrupted: false,
        };

        // Backfill, removed monitors first, then present ones in order.
        let mut blocked = Vec::new();
        for task in plan_backfill(&diff, &current, &disk, self.timeline.len()) {
            if self.shutdown.is_triggered() {
                report.interrupted = true;
                break;
            }
            let dir = monitor_dir(&self.config.root_dir, &task.identity);
            match backfill_directory(
                &dir,
                &task.identity,
                task.have,
                task.target,
                &self.timeline,
                self.encoder.as_ref(),
            ) {
                Ok(written) => report.fillers_written += written,
                Err(e) => {
                    tracing::error!(
                        monitor = %task.identity,
                        reason = ?task.reason,
                        error = %e,
                        "Backfill halted for directory"
                    );
                    report.failures.push(MonitorFailure {
                        identity: task.identity,
                        stage: FailureStage::Backfill,
                        message: e.to_string(),
                    });
                    if task.reason != BackfillReason::Removed {
                        blocked.push(task.identity);
                    }
                }
            }
        }

        if !report.interrupted {
            self.capture_present(&current, &blocked, &timestamp, &mut report)
                .await;
        }

        // Frames of this tick may already be on disk even if interrupted.
        self.timeline.push(timestamp)?;
        self.previous = current;
        self.ticks += 1;
        report.max_frame_count = self.timeline.len();
        Ok(report)
    }

    /// Capture one real frame per present monitor, in parallel, and join
    /// every capture before returning.
    async fn capture_present(
        &self,
        current: &TopologySnapshot,
        blocked: &[MonitorIdentity],
        timestamp: &str,
        report: &mut TickReport,
    ) {
        let permits = Arc::new(Semaphore::new(self.config.max_parallel_captures.max(1)));
        let mut tasks = JoinSet::new();

        for record in current.records() {
            if blocked.contains(&record.identity) {
                tracing::warn!(
                    monitor = %record.identity,
                    "Skipping capture; directory could not be brought up to date"
                );
                continue;
            }
            if self.shutdown.is_triggered() {
                report.interrupted = true;
                break;
            }

            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let backend = self.backend.clone();
            let encoder = self.encoder.clone();
            let identity = record.identity;
            let rect = record.info.rect();
            let path = frame_path(
                &monitor_dir(&self.config.root_dir, &identity),
                &FrameName::real(timestamp),
            );

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let outcome = match backend.capture(rect) {
                    Ok(image) => encoder
                        .encode(&image, &path)
                        .map_err(|e| (FailureStage::Write, e)),
                    Err(e) => Err((FailureStage::Capture, e)),
                };
                (identity, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.frames_captured += 1,
                Ok((identity, Err((stage, e)))) => {
                    if e.is_transient() {
                        tracing::warn!(
                            monitor = %identity,
                            error = %e,
                            "Capture failed; skipping monitor this tick"
                        );
                    } else {
                        tracing::error!(monitor = %identity, error = %e, "Failed to write frame");
                    }
                    report.failures.push(MonitorFailure {
                        identity,
                        stage,
                        message: e.to_string(),
                    });
                }
                Err(e) => tracing::error!(error = %e, "Capture task panicked or was cancelled"),
            }
        }
    }

    fn reached_tick_limit(&self) -> bool {
        self.config
            .max_ticks
            .is_some_and(|limit| self.ticks >= limit)
    }
}

fn log_report(report: &TickReport) {
    if report.failures.is_empty() {
        tracing::info!(
            tick = report.tick,
            timestamp = %report.timestamp,
            captured = report.frames_captured,
            fillers = report.fillers_written,
            max_frame_count = report.max_frame_count,
            "Tick complete"
        );
    } else {
        tracing::warn!(
            tick = report.tick,
            timestamp = %report.timestamp,
            captured = report.frames_captured,
            fillers = report.fillers_written,
            failures = report.failures.len(),
            max_frame_count = report.max_frame_count,
            "Tick complete with failures"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SyntheticBackend;
    use crate::encoder::PngEncoder;
    use lapse_common::clock::SteppedClock;

    fn session(root: PathBuf, backend: Arc<SyntheticBackend>) -> CaptureSession {
        CaptureSession::new(
            SessionConfig {
                root_dir: root,
                interval: Duration::from_millis(1),
                max_parallel_captures: 2,
                max_ticks: None,
            },
            backend,
            Arc::new(PngEncoder),
            Arc::new(SteppedClock::from_epoch_secs()),
        )
    }

    #[tokio::test]
    async fn single_tick_captures_every_monitor() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = Arc::new(SyntheticBackend::from_layout("16x8+0+0,8x8+16+0").unwrap());
        let mut session = session(tmp.path().to_path_buf(), backend.clone());

        let report = session.run_tick().await.unwrap();
        assert_eq!(report.frames_captured, 2);
        assert_eq!(report.fillers_written, 0);
        assert_eq!(report.max_frame_count, 1);
        assert_eq!(report.diff.added.len(), 2);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(backend.capture_count(), 2);
    }

    #[tokio::test]
    async fn run_honours_tick_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = Arc::new(SyntheticBackend::from_layout("8x8+0+0").unwrap());
        let mut session = session(tmp.path().to_path_buf(), backend);
        session.config.max_ticks = Some(3);

        assert_eq!(session.run().await.unwrap(), 3);
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(session.max_frame_count(), 3);
    }

    #[tokio::test]
    async fn run_stops_when_signalled() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = Arc::new(SyntheticBackend::from_layout("8x8+0+0").unwrap());
        let mut session = session(tmp.path().to_path_buf(), backend);
        session.config.interval = Duration::from_secs(3600);

        let signal = session.shutdown_signal();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            signal.trigger();
        });

        let ticks = tokio::time::timeout(Duration::from_secs(10), session.run())
            .await
            .expect("loop should exit promptly")
            .unwrap();
        assert_eq!(ticks, 1);
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[tokio::test]
    async fn repeated_timestamp_skips_the_tick() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = Arc::new(SyntheticBackend::from_layout("8x8+0+0").unwrap());
        let frozen = chrono::Utc::now();
        let mut session = CaptureSession::new(
            SessionConfig {
                root_dir: tmp.path().to_path_buf(),
                interval: Duration::from_millis(1),
                max_parallel_captures: 1,
                max_ticks: None,
            },
            backend,
            Arc::new(PngEncoder),
            Arc::new(SteppedClock::new(frozen, chrono::Duration::zero())),
        );

        session.run_tick().await.unwrap();
        let err = session.run_tick().await.unwrap_err();
        assert!(matches!(err, LapseError::TimestampCollision { .. }));
        assert_eq!(session.max_frame_count(), 1);
        assert_eq!(session.ticks(), 1);
    }

    #[tokio::test]
    async fn every_tick_lands_through_daylight_saving_end() {
        use chrono::TimeZone;

        let tmp = tempfile::tempdir().unwrap();
        let backend = Arc::new(SyntheticBackend::from_layout("8x8+0+0").unwrap());
        // New York falls back at 06:00Z; the wall clock repeats 01:00-02:00.
        let start = chrono::Utc.with_ymd_and_hms(2026, 11, 1, 5, 40, 0).unwrap();
        let mut session = CaptureSession::new(
            SessionConfig {
                root_dir: tmp.path().to_path_buf(),
                interval: Duration::from_millis(1),
                max_parallel_captures: 1,
                max_ticks: None,
            },
            backend,
            Arc::new(PngEncoder),
            Arc::new(SteppedClock::new(start, chrono::Duration::minutes(5))),
        );

        for expected in 1..=24 {
            let report = session.run_tick().await.unwrap();
            assert_eq!(report.frames_captured, 1);
            assert_eq!(report.max_frame_count, expected);
        }
        assert_eq!(
            session.timeline().last(),
            Some("2026-11-01_07-35-00-000")
        );
    }
}
