//! Deterministic in-process capture backend.
//!
//! Produces test-pattern frames for a scriptable monitor layout. Used by
//! the test suite and by `lapse record --backend synthetic` for dry runs
//! on machines without a display.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use image::{ImageBuffer, Rgba, RgbaImage};
use lapse_common::error::{LapseError, LapseResult};
use lapse_platform_core::{CaptureRect, MonitorIdentity, MonitorInfo};

use super::CaptureBackend;

#[derive(Debug)]
pub struct SyntheticBackend {
    monitors: Mutex<Vec<MonitorInfo>>,
    failing: Mutex<HashSet<MonitorIdentity>>,
    captures: AtomicU64,
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new(vec![MonitorInfo {
            name: "synthetic-0".to_string(),
            width: 1920,
            height: 1080,
            x: 0,
            y: 0,
            primary: true,
        }])
    }
}

impl SyntheticBackend {
    pub fn new(monitors: Vec<MonitorInfo>) -> Self {
        Self {
            monitors: Mutex::new(monitors),
            failing: Mutex::new(HashSet::new()),
            captures: AtomicU64::new(0),
        }
    }

    /// Build a backend from a layout string, see [`parse_layout`].
    pub fn from_layout(layout: &str) -> LapseResult<Self> {
        Ok(Self::new(parse_layout(layout)?))
    }

    /// Replace the attached monitors (simulates hot-plugging).
    pub fn set_monitors(&self, monitors: Vec<MonitorInfo>) {
        *lock(&self.monitors) = monitors;
    }

    /// Make captures of `identity` fail until [`SyntheticBackend::heal`].
    pub fn fail(&self, identity: MonitorIdentity) {
        lock(&self.failing).insert(identity);
    }

    pub fn heal(&self, identity: &MonitorIdentity) {
        lock(&self.failing).remove(identity);
    }

    /// Number of successful captures so far.
    pub fn capture_count(&self) -> u64 {
        self.captures.load(Ordering::SeqCst)
    }
}

impl CaptureBackend for SyntheticBackend {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn detect_monitors(&self) -> LapseResult<Vec<MonitorInfo>> {
        Ok(lock(&self.monitors).clone())
    }

    fn capture(&self, rect: CaptureRect) -> LapseResult<RgbaImage> {
        if let Some(broken) = lock(&self.failing).iter().find(|id| id.rect() == rect) {
            return Err(LapseError::capture(format!("Synthetic failure for {broken}")));
        }
        if !lock(&self.monitors).iter().any(|m| m.rect() == rect) {
            return Err(LapseError::capture(format!(
                "No synthetic monitor covers {}x{}+{}+{}",
                rect.width, rect.height, rect.x, rect.y
            )));
        }

        let seq = self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(test_pattern(rect.width, rect.height, seq))
    }
}

/// Diagonal gradient whose blue channel encodes the capture sequence number.
fn test_pattern(width: u32, height: u32, seq: u64) -> RgbaImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, (seq % 256) as u8, 255])
    })
}

/// Parse a comma-separated list of X11-style geometries such as
/// `1920x1080+0+0,1280x720+1920+0` or `2560x1440-2560+0`.
pub fn parse_layout(layout: &str) -> LapseResult<Vec<MonitorInfo>> {
    layout
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(index, geometry)| {
            let rect = parse_geometry(geometry).ok_or_else(|| {
                LapseError::config(format!(
                    "Invalid monitor geometry '{geometry}', expected WxH+X+Y"
                ))
            })?;
            Ok(MonitorInfo {
                name: format!("synthetic-{index}"),
                width: rect.width,
                height: rect.height,
                x: rect.x,
                y: rect.y,
                primary: index == 0,
            })
        })
        .collect()
}

fn parse_geometry(geometry: &str) -> Option<CaptureRect> {
    let (width, rest) = geometry.split_once('x')?;
    let offset_start = rest.find(is_sign)?;
    let (height, offsets) = rest.split_at(offset_start);
    let second = offsets[1..].find(is_sign)? + 1;
    let (x, y) = offsets.split_at(second);

    Some(CaptureRect {
        width: width.parse().ok()?,
        height: height.parse().ok()?,
        x: parse_signed(x)?,
        y: parse_signed(y)?,
    })
}

fn is_sign(c: char) -> bool {
    c == '+' || c == '-'
}

fn parse_signed(s: &str) -> Option<i32> {
    s.strip_prefix('+').unwrap_or(s).parse().ok()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
