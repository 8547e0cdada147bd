//! Screen capture sources and diagnostic dumps.
//!
//! This module provides:
//! - The `CaptureSource` trait the bot reads frames from
//! - Primary-monitor capture on Windows (`ScreenCapture`)
//! - File-backed capture for offline analysis (`FileCapture`)
//! - Saving a capture to disk for inspection (`save_capture`)

#[cfg(windows)]
pub mod screenshot;

#[cfg(windows)]
pub use screenshot::ScreenCapture;

use anyhow::{Context, Result};
use chrono::Local;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Anything that can produce the current full-screen image.
pub trait CaptureSource {
    fn capture(&mut self) -> Result<RgbImage>;
}

/// Serves a saved screenshot as if it were the live screen.
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptureSource for FileCapture {
    fn capture(&mut self) -> Result<RgbImage> {
        load_rgb(&self.path)
    }
}

/// Loads an image file as RGB, dropping any alpha channel.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to load image {}", path.display()))?;
    Ok(img.to_rgb8())
}

/// Saves `img` as `capture_YYYYMMDD_HHMMSS.png` in `dir`.
///
/// Returns the path of the written file.
pub fn save_capture(img: &RgbImage, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("capture_{}.png", timestamp));

    img.save(&path)
        .with_context(|| format!("Failed to save {}", path.display()))?;
    crate::log(&format!("Saved capture to {}", path.display()));

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_reload_capture() {
        let dir = tempdir().unwrap();
        let img = RgbImage::from_fn(8, 5, |x, y| Rgb([x as u8 * 30, y as u8 * 50, 7]));

        let path = save_capture(&img, dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("capture_"));
        assert!(name.ends_with(".png"));

        let mut source = FileCapture::new(&path);
        assert_eq!(source.capture().unwrap(), img);
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("captures").join("today");

        let path = save_capture(&RgbImage::new(2, 2), &nested).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_load_rgb_drops_alpha() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rgba.png");
        let rgba = image::RgbaImage::from_pixel(3, 3, image::Rgba([10, 20, 30, 128]));
        rgba.save(&path).unwrap();

        let rgb = load_rgb(&path).unwrap();

        assert_eq!(*rgb.get_pixel(1, 1), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_missing_file() {
        let mut source = FileCapture::new("does/not/exist.png");
        assert!(source.capture().is_err());
    }
}
