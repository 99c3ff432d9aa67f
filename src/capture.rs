//! Screen capture boundary
//!
//! Wraps the platform capture capability behind a small trait so the
//! tracker loop can run against a scripted frame source in tests.

use image::GrayImage;
use thiserror::Error;

/// A specialized `Result` type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {description}")]
    MonitorEnumerationFailed { description: String },

    #[error("No monitors found")]
    NoMonitors,

    #[error("Screen capture failed: {description}")]
    CaptureFailed { description: String },
}

/// Source of full-virtual-screen frames.
pub trait ScreenGrabber: Send {
    /// Capture the screen as a grayscale buffer.
    fn grab(&mut self) -> CaptureResult<GrayImage>;
}

/// Production grabber capturing the primary monitor via `xcap`.
pub struct XcapGrabber;

impl XcapGrabber {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XcapGrabber {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenGrabber for XcapGrabber {
    fn grab(&mut self) -> CaptureResult<GrayImage> {
        let monitors =
            xcap::Monitor::all().map_err(|e| CaptureError::MonitorEnumerationFailed {
                description: e.to_string(),
            })?;

        let monitor = monitors
            .into_iter()
            .find(|m| m.is_primary())
            .or_else(|| xcap::Monitor::all().ok()?.into_iter().next())
            .ok_or(CaptureError::NoMonitors)?;

        let rgba = monitor
            .capture_image()
            .map_err(|e| CaptureError::CaptureFailed {
                description: e.to_string(),
            })?;

        Ok(image::DynamicImage::ImageRgba8(rgba).to_luma8())
    }
}
