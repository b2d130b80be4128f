//! Lapse platform core contracts.
//!
//! Display geometry and monitor identity shared by the frame store and the
//! capture engine without coupling to a concrete capture backend.
//!
//! Display indices reported by the OS are not stable across hot-plug
//! events, so a monitor is keyed by its geometry instead. Two monitors
//! with identical geometry collapse onto the same key, and a resolution
//! change turns into a different monitor. Both are intentional.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every monitor directory name.
pub const MONITOR_DIR_PREFIX: &str = "screen_";

/// Information about a connected monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorInfo {
    /// Monitor name as reported by the backend. Informational only.
    pub name: String,
    /// Resolution in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Position in the virtual desktop (pixels).
    pub x: i32,
    pub y: i32,
    /// Whether this monitor is primary.
    pub primary: bool,
}

impl MonitorInfo {
    /// Rectangle covered by this monitor in the virtual desktop.
    pub fn rect(&self) -> CaptureRect {
        CaptureRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// A rectangle in virtual desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Stable key for a physical display: `(width, height, x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonitorIdentity {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl MonitorIdentity {
    /// Derive the identity of a monitor from its geometry. Zero-sized or
    /// otherwise odd geometry is passed through unchanged.
    pub fn of(monitor: &MonitorInfo) -> Self {
        Self {
            width: monitor.width,
            height: monitor.height,
            x: monitor.x,
            y: monitor.y,
        }
    }

    /// Directory name for this monitor, e.g. `screen_1920x1080_0_0`.
    pub fn dir_name(&self) -> String {
        self.to_string()
    }

    /// Parse a directory name produced by [`MonitorIdentity::dir_name`].
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(MONITOR_DIR_PREFIX)?;
        let mut parts = rest.splitn(3, '_');
        let size = parts.next()?;
        let x = parts.next()?.parse().ok()?;
        let y = parts.next()?.parse().ok()?;
        let (w, h) = size.split_once('x')?;
        Some(Self {
            width: w.parse().ok()?,
            height: h.parse().ok()?,
            x,
            y,
        })
    }

    /// The rectangle this identity describes.
    pub fn rect(&self) -> CaptureRect {
        CaptureRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

impl fmt::Display for MonitorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{MONITOR_DIR_PREFIX}{}x{}_{}_{}",
            self.width, self.height, self.x, self.y
        )
    }
}

/// A monitor as seen during one tick: its identity plus the geometry it
/// was detected with.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorRecord {
    pub identity: MonitorIdentity,
    pub info: MonitorInfo,
}

/// Resolve an identity for every detected monitor, in detection order.
///
/// Monitors that collide on the same identity are all returned; callers
/// keying by identity keep whichever they see first.
pub fn resolve_identities(monitors: &[MonitorInfo]) -> Vec<MonitorRecord> {
    monitors
        .iter()
        .map(|info| MonitorRecord {
            identity: MonitorIdentity::of(info),
            info: info.clone(),
        })
        .collect()
}

/// Compute virtual desktop bounds that include all connected monitors.
/// Returns `None` when no monitor is connected.
pub fn virtual_desktop_bounds(monitors: &[MonitorInfo]) -> Option<CaptureRect> {
    let min_x = monitors.iter().map(|m| m.x).min()?;
    let min_y = monitors.iter().map(|m| m.y).min()?;
    let max_x = monitors.iter().map(|m| m.x + m.width as i32).max()?;
    let max_y = monitors.iter().map(|m| m.y + m.height as i32).max()?;

    Some(CaptureRect {
        x: min_x,
        y: min_y,
        width: (max_x - min_x).max(0) as u32,
        height: (max_y - min_y).max(0) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn monitor(name: &str, width: u32, height: u32, x: i32, y: i32) -> MonitorInfo {
        MonitorInfo {
            name: name.to_string(),
            width,
            height,
            x,
            y,
            primary: false,
        }
    }

    #[test]
    fn identity_dir_name_includes_geometry() {
        let id = MonitorIdentity::of(&monitor("DP-1", 1280, 720, 1920, 0));
        assert_eq!(id.dir_name(), "screen_1280x720_1920_0");
    }

    #[test]
    fn identity_ignores_name() {
        let a = MonitorIdentity::of(&monitor("HDMI-1", 1920, 1080, 0, 0));
        let b = MonitorIdentity::of(&monitor("DP-3", 1920, 1080, 0, 0));
        assert_eq!(a, b);
    }

    #[test]
    fn negative_offsets_parse_back() {
        let id = MonitorIdentity::of(&monitor("left", 2560, 1440, -2560, -120));
        assert_eq!(id.dir_name(), "screen_2560x1440_-2560_-120");
        assert_eq!(MonitorIdentity::parse(&id.dir_name()), Some(id));
    }

    #[test]
    fn parse_rejects_foreign_directories() {
        assert_eq!(MonitorIdentity::parse("screen_1"), None);
        assert_eq!(MonitorIdentity::parse("exports"), None);
        assert_eq!(MonitorIdentity::parse("screen_axb_0_0"), None);
    }

    #[test]
    fn zero_size_geometry_is_passed_through() {
        let records = resolve_identities(&[monitor("ghost", 0, 0, 0, 0)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity.dir_name(), "screen_0x0_0_0");
    }

    #[test]
    fn virtual_bounds_cover_negative_origin_layout() {
        let monitors = vec![
            monitor("left", 1920, 1080, -1920, 0),
            monitor("main", 2560, 1440, 0, 0),
        ];

        let bounds = virtual_desktop_bounds(&monitors).unwrap();
        assert_eq!(bounds.x, -1920);
        assert_eq!(bounds.y, 0);
        assert_eq!(bounds.width, 4480);
        assert_eq!(bounds.height, 1440);
        assert_eq!(virtual_desktop_bounds(&[]), None);
    }

    proptest! {
        #[test]
        fn dir_name_parse_roundtrip(w in 0u32..10_000, h in 0u32..10_000, x in -20_000i32..20_000, y in -20_000i32..20_000) {
            let id = MonitorIdentity { width: w, height: h, x, y };
            prop_assert_eq!(MonitorIdentity::parse(&id.dir_name()), Some(id));
        }
    }
}
