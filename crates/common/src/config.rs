//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding one subdirectory per monitor.
    pub root_dir: PathBuf,

    /// Default capture settings.
    pub capture: CaptureDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

const DEFAULT_INTERVAL_SECS: f64 = 5.0;

/// Default capture loop parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureDefaults {
    /// Seconds between capture ticks.
    pub interval_secs: f64,

    /// Upper bound on monitors grabbed concurrently within one tick.
    pub max_parallel_captures: usize,

    /// Capture backend name (`xcap` or `synthetic`).
    pub backend: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "lapse=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_dir: dirs_default_captures(),
            capture: CaptureDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            max_parallel_captures: 4,
            backend: "xcap".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl CaptureDefaults {
    /// Tick interval as a `Duration`, clamped to at least one millisecond.
    /// Values that do not fit a `Duration` fall back to the default.
    pub fn interval(&self) -> std::time::Duration {
        let fallback = std::time::Duration::from_secs_f64(DEFAULT_INTERVAL_SECS);
        if self.interval_secs.is_nan() {
            return fallback;
        }
        let secs = self.interval_secs.max(0.001);
        std::time::Duration::try_from_secs_f64(secs).unwrap_or_else(|e| {
            tracing::warn!(
                interval_secs = self.interval_secs,
                error = %e,
                "Capture interval out of range, using default"
            );
            fallback
        })
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("lapse").join("config.json")
}

/// Default capture root.
fn dirs_default_captures() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("lapse").join("captures")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_capture_section_fills_defaults() {
        let json = r#"{
            "root_dir": "/tmp/lapse",
            "capture": { "interval_secs": 1.5 },
            "logging": { "level": "debug", "json": false, "file": null }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/tmp/lapse"));
        assert!((config.capture.interval_secs - 1.5).abs() < 1e-9);
        assert_eq!(config.capture.max_parallel_captures, 4);
        assert_eq!(config.capture.backend, "xcap");
    }

    #[test]
    fn interval_is_clamped() {
        let mut defaults = CaptureDefaults::default();
        assert_eq!(defaults.interval(), std::time::Duration::from_secs(5));

        defaults.interval_secs = 0.0;
        assert_eq!(defaults.interval(), std::time::Duration::from_millis(1));

        defaults.interval_secs = f64::NAN;
        assert_eq!(defaults.interval(), std::time::Duration::from_secs(5));

        defaults.interval_secs = 1e20;
        assert_eq!(defaults.interval(), std::time::Duration::from_secs(5));

        defaults.interval_secs = f64::INFINITY;
        assert_eq!(defaults.interval(), std::time::Duration::from_secs(5));

        defaults.interval_secs = 3600.0;
        assert_eq!(defaults.interval(), std::time::Duration::from_secs(3600));
    }
}
