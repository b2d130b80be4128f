//! Frame encoding to disk.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use lapse_common::error::{LapseError, LapseResult};
use lapse_frame_store::partial_path;

/// Writes a frame image to a path.
pub trait FrameEncoder: Send + Sync {
    /// Encode `image` to `path`. On success the file is complete; on
    /// failure no file exists at `path`.
    fn encode(&self, image: &RgbaImage, path: &Path) -> LapseResult<()>;
}

/// PNG encoder that writes to a `.part` file and renames it into place.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl FrameEncoder for PngEncoder {
    fn encode(&self, image: &RgbaImage, path: &Path) -> LapseResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let partial = partial_path(path);
        if let Err(e) = image.save_with_format(&partial, ImageFormat::Png) {
            let _ = std::fs::remove_file(&partial);
            return Err(LapseError::encode(path, e.to_string()));
        }

        std::fs::rename(&partial, path).map_err(|e| {
            let _ = std::fs::remove_file(&partial);
            LapseError::encode(path, format!("Failed to move frame into place: {e}"))
        })
    }
}

/// A flat black frame of the given size.
pub fn filler_frame(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_encoder_leaves_no_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("screen_4x2_0_0").join("frame.png");

        PngEncoder.encode(&filler_frame(4, 2), &path).unwrap();

        assert!(path.exists());
        assert!(!partial_path(&path).exists());
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert!(decoded.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn failed_encode_reports_target_path() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory squatting on the partial path makes the write fail.
        let path = tmp.path().join("frame.png");
        std::fs::create_dir_all(partial_path(&path)).unwrap();

        let err = PngEncoder.encode(&filler_frame(2, 2), &path).unwrap_err();
        assert!(matches!(err, LapseError::Encode { .. }));
        assert!(!path.exists());
    }
}
