//! Clock abstraction and frame timestamp formatting.
//!
//! Every frame file is named after the tick it belongs to. The capture
//! loop reads wall-clock time through the [`Clock`] trait so tests can
//! drive it with a deterministic [`SteppedClock`].
//!
//! Stamps are UTC. Local wall time repeats an hour when daylight saving
//! ends, which would make the names stop sorting in tick order.

use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

/// Format used for frame file stems. Lexicographic order equals time order.
pub const FRAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S-%3f";

/// Source of wall-clock time for capture ticks.
pub trait Clock: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that starts at a fixed instant and advances by `step` on every
/// call to [`Clock::now`].
#[derive(Debug)]
pub struct SteppedClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppedClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }

    /// Clock starting at 2026-01-01 00:00:00 UTC, one second per tick.
    pub fn from_epoch_secs() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self::new(start, Duration::seconds(1))
    }
}

impl Clock for SteppedClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = match self.next.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = *next;
        *next = current + self.step;
        current
    }
}

/// Render a time as a frame timestamp.
pub fn format_frame_timestamp(time: &DateTime<Utc>) -> String {
    time.format(FRAME_TIMESTAMP_FORMAT).to_string()
}

/// Parse a frame timestamp back into a naive date-time.
pub fn parse_frame_timestamp(stamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stamp, FRAME_TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepped_clock_advances_per_call() {
        let clock = SteppedClock::from_epoch_secs();
        let a = format_frame_timestamp(&clock.now());
        let b = format_frame_timestamp(&clock.now());
        assert_eq!(a, "2026-01-01_00-00-00-000");
        assert_eq!(b, "2026-01-01_00-00-01-000");
    }

    #[test]
    fn timestamps_sort_chronologically() {
        let clock = SteppedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 9, 23, 59, 59).unwrap(),
            Duration::milliseconds(250),
        );
        let stamps: Vec<String> = (0..8).map(|_| format_frame_timestamp(&clock.now())).collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
    }

    #[test]
    fn stamps_keep_order_across_daylight_saving_end() {
        // 2026-11-01 06:00Z is when New York falls back from EDT to EST.
        let start = Utc.with_ymd_and_hms(2026, 11, 1, 5, 40, 0).unwrap();
        let transition = Utc.with_ymd_and_hms(2026, 11, 1, 6, 0, 0).unwrap();
        let edt = chrono::FixedOffset::west_opt(4 * 3600).unwrap();
        let est = chrono::FixedOffset::west_opt(5 * 3600).unwrap();
        let clock = SteppedClock::new(start, Duration::minutes(5));

        let mut stamps = Vec::new();
        let mut wall = Vec::new();
        for _ in 0..24 {
            let now = clock.now();
            let offset = if now < transition { edt } else { est };
            wall.push(now.with_timezone(&offset).naive_local());
            stamps.push(format_frame_timestamp(&now));
        }

        assert!(wall.windows(2).any(|w| w[1] <= w[0]));
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn timestamp_parse_roundtrip() {
        let parsed = parse_frame_timestamp("2026-01-01_12-30-45-120").unwrap();
        assert_eq!(
            parsed.format(FRAME_TIMESTAMP_FORMAT).to_string(),
            "2026-01-01_12-30-45-120"
        );
        assert!(parse_frame_timestamp("not-a-time").is_none());
    }
}
