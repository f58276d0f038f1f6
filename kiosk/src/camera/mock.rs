use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

use super::{CameraDevice, CameraError, OverlayId, PaddedImage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraEvent {
    PreviewStarted,
    PreviewStopped,
    Added { id: OverlayId, layer: i32 },
    Alpha { id: OverlayId, alpha: u8 },
    Removed(OverlayId),
    Cleared(usize),
    Annotation(String),
    Captured(PathBuf),
}

#[derive(Debug, Clone)]
pub struct MockOverlay {
    pub layer: i32,
    pub width: u32,
    pub height: u32,
    pub alpha: u8,
}

/// Records every call; captures write a small real JPEG so playback can load it.
#[derive(Default)]
pub struct MockCamera {
    pub events: Vec<CameraEvent>,
    pub live: BTreeMap<OverlayId, MockOverlay>,
    pub previewing: bool,
    pub fail_capture: bool,
    next_id: u32,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captures(&self) -> Vec<PathBuf> {
        self.events
            .iter()
            .filter_map(|e| match e {
                CameraEvent::Captured(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn annotations(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                CameraEvent::Annotation(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn added(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CameraEvent::Added { .. }))
            .count()
    }

    pub fn removed(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CameraEvent::Removed(_)))
            .count()
    }
}

impl CameraDevice for MockCamera {
    async fn start_preview(&mut self) -> Result<(), CameraError> {
        self.previewing = true;
        self.events.push(CameraEvent::PreviewStarted);
        Ok(())
    }

    async fn stop_preview(&mut self) -> Result<(), CameraError> {
        self.previewing = false;
        self.events.push(CameraEvent::PreviewStopped);
        Ok(())
    }

    fn add_overlay(&mut self, source: PaddedImage, layer: i32) -> Result<OverlayId, CameraError> {
        assert_eq!(
            source.rgb.len(),
            (source.padded_width * source.padded_height * 3) as usize
        );
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        self.live.insert(
            id,
            MockOverlay {
                layer,
                width: source.width,
                height: source.height,
                alpha: 255,
            },
        );
        self.events.push(CameraEvent::Added { id, layer });
        Ok(id)
    }

    fn set_overlay_alpha(&mut self, id: OverlayId, alpha: u8) -> Result<(), CameraError> {
        let overlay = self
            .live
            .get_mut(&id)
            .ok_or(CameraError::UnknownOverlay(id))?;
        overlay.alpha = alpha;
        self.events.push(CameraEvent::Alpha { id, alpha });
        Ok(())
    }

    fn remove_overlay(&mut self, id: OverlayId) -> Result<(), CameraError> {
        self.live
            .remove(&id)
            .ok_or(CameraError::UnknownOverlay(id))?;
        self.events.push(CameraEvent::Removed(id));
        Ok(())
    }

    fn clear_overlays(&mut self) -> Result<usize, CameraError> {
        let count = self.live.len();
        self.live.clear();
        self.events.push(CameraEvent::Cleared(count));
        Ok(count)
    }

    fn set_annotation(&mut self, text: &str) -> Result<(), CameraError> {
        self.events.push(CameraEvent::Annotation(text.to_string()));
        Ok(())
    }

    async fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        self.events.push(CameraEvent::Captured(path.to_path_buf()));
        if self.fail_capture {
            return Err(CameraError::Capture("sensor timeout".into()));
        }
        RgbImage::from_pixel(48, 32, Rgb([90, 140, 200]))
            .save(path)
            .map_err(|e| CameraError::Capture(e.to_string()))
    }
}
