use std::sync::Arc;

use image::RgbaImage;
use lapse_common::error::{LapseError, LapseResult};
use lapse_platform_core::{CaptureRect, MonitorInfo};

/// Abstract interface for platform-specific screen capture.
///
/// Calls block; the session runs them on the blocking thread pool.
pub trait CaptureBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Detect currently attached monitors.
    fn detect_monitors(&self) -> LapseResult<Vec<MonitorInfo>>;

    /// Grab the pixels inside `rect` (virtual desktop coordinates). The
    /// returned image is `rect.width` x `rect.height`.
    fn capture(&self, rect: CaptureRect) -> LapseResult<RgbaImage>;
}

pub mod synthetic;
#[cfg(feature = "xcap")]
pub mod xcap_backend;

pub use synthetic::SyntheticBackend;
#[cfg(feature = "xcap")]
pub use xcap_backend::XcapBackend;

/// Names accepted by [`backend_by_name`] in this build.
pub fn available_backends() -> &'static [&'static str] {
    #[cfg(feature = "xcap")]
    {
        &["xcap", "synthetic"]
    }
    #[cfg(not(feature = "xcap"))]
    {
        &["synthetic"]
    }
}

/// Instantiate a backend by name.
pub fn backend_by_name(name: &str) -> LapseResult<Arc<dyn CaptureBackend>> {
    match name {
        #[cfg(feature = "xcap")]
        "xcap" => Ok(Arc::new(XcapBackend::new())),
        "synthetic" => Ok(Arc::new(SyntheticBackend::default())),
        other => Err(LapseError::unsupported(format!(
            "Capture backend '{other}' is not available (built with: {})",
            available_backends().join(", ")
        ))),
    }
}
