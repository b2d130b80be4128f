//! Screen capture through the `xcap` crate (X11, Wayland, Windows, macOS).

use image::RgbaImage;
use lapse_common::error::{LapseError, LapseResult};
use lapse_platform_core::{CaptureRect, MonitorInfo};
use xcap::Monitor;

use super::CaptureBackend;

#[derive(Debug, Clone, Copy, Default)]
pub struct XcapBackend;

impl XcapBackend {
    pub fn new() -> Self {
        Self
    }
}

fn monitor_info(monitor: &Monitor) -> LapseResult<MonitorInfo> {
    let platform = |e: xcap::XCapError| LapseError::platform(format!("Monitor query failed: {e}"));
    Ok(MonitorInfo {
        name: monitor.name().unwrap_or_default(),
        width: monitor.width().map_err(platform)?,
        height: monitor.height().map_err(platform)?,
        x: monitor.x().map_err(platform)?,
        y: monitor.y().map_err(platform)?,
        primary: monitor.is_primary().unwrap_or(false),
    })
}

impl CaptureBackend for XcapBackend {
    fn name(&self) -> &str {
        "xcap"
    }

    fn detect_monitors(&self) -> LapseResult<Vec<MonitorInfo>> {
        let monitors = Monitor::all()
            .map_err(|e| LapseError::platform(format!("Failed to enumerate monitors: {e}")))?;

        let mut infos = Vec::with_capacity(monitors.len());
        for monitor in &monitors {
            match monitor_info(monitor) {
                Ok(info) => infos.push(info),
                Err(e) => tracing::warn!(error = %e, "Skipping monitor with unreadable geometry"),
            }
        }
        tracing::debug!(count = infos.len(), "Detected monitors");
        Ok(infos)
    }

    fn capture(&self, rect: CaptureRect) -> LapseResult<RgbaImage> {
        let monitors = Monitor::all()
            .map_err(|e| LapseError::capture(format!("Failed to enumerate monitors: {e}")))?;

        let monitor = monitors
            .iter()
            .find(|m| monitor_info(m).map(|info| info.rect() == rect).unwrap_or(false))
            .ok_or_else(|| {
                LapseError::capture(format!(
                    "No monitor at {}x{}+{}+{}",
                    rect.width, rect.height, rect.x, rect.y
                ))
            })?;

        let image = monitor
            .capture_image()
            .map_err(|e| LapseError::capture(format!("Failed to capture screen: {e}")))?;

        if image.dimensions() != (rect.width, rect.height) {
            tracing::debug!(
                expected_w = rect.width,
                expected_h = rect.height,
                got_w = image.width(),
                got_h = image.height(),
                "Captured image size differs from monitor geometry"
            );
        }
        Ok(image)
    }
}
