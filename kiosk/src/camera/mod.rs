pub mod compositor;
pub mod rpicam;

#[cfg(test)]
pub mod mock;

use std::fmt;
use std::path::Path;

pub use rpicam::RpicamDevice;

/// Identifier the compositor assigns to an overlay it is displaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayId(pub u32);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// RGB pixels padded to the display hardware's block alignment.
///
/// `rgb` holds `padded_width * padded_height * 3` bytes; only the top-left
/// `width x height` region is meant to be shown.
#[derive(Debug, Clone)]
pub struct PaddedImage {
    pub rgb: Vec<u8>,
    pub padded_width: u32,
    pub padded_height: u32,
    pub width: u32,
    pub height: u32,
}

/// The capability set the kiosk consumes from the camera. Rotation,
/// resolution and annotation style are fixed when the device is constructed.
pub trait CameraDevice {
    async fn start_preview(&mut self) -> Result<(), CameraError>;

    async fn stop_preview(&mut self) -> Result<(), CameraError>;

    /// Composite `source` above the preview at the given stacking layer
    /// (higher draws on top), fully opaque.
    fn add_overlay(&mut self, source: PaddedImage, layer: i32) -> Result<OverlayId, CameraError>;

    fn set_overlay_alpha(&mut self, id: OverlayId, alpha: u8) -> Result<(), CameraError>;

    fn remove_overlay(&mut self, id: OverlayId) -> Result<(), CameraError>;

    /// Remove every overlay still on screen and return how many there were.
    fn clear_overlays(&mut self) -> Result<usize, CameraError>;

    /// Show a short text line over the preview. An empty string clears it.
    fn set_annotation(&mut self, text: &str) -> Result<(), CameraError>;

    /// Expose one still frame and write it as a JPEG to `path`. Returns once
    /// the file is complete.
    async fn capture(&mut self, path: &Path) -> Result<(), CameraError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("failed to spawn {0}: {1}")]
    Spawn(String, String),
    #[error("no camera available: {0}")]
    Unavailable(String),
    #[error("preview failed: {0}")]
    Preview(String),
    #[error("still capture failed: {0}")]
    Capture(String),
    #[error("display write failed: {0}")]
    Display(String),
    #[error("invalid annotation font {0}: {1}")]
    Font(String, String),
    #[error("unknown overlay {0}")]
    UnknownOverlay(OverlayId),
}
