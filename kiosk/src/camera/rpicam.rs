use std::path::{Path, PathBuf};
use std::process::Stdio;

use photobooth_common::config::{CameraConfig, DisplayConfig};
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use super::compositor::{AnnotationStyle, Compositor, FramebufferSink};
use super::{CameraDevice, CameraError, OverlayId, PaddedImage};

/// Raspberry Pi camera driven through the `rpicam-apps` tools.
///
/// The live preview is a long-running `rpicam-hello` child. Stills come from
/// `rpicam-still`, which needs the sensor to itself, so the preview is
/// stopped around each exposure. Overlays and the annotation are drawn by a
/// [`Compositor`] onto the framebuffer.
pub struct RpicamDevice {
    config: CameraConfig,
    preview: Option<Child>,
    compositor: Compositor,
}

impl RpicamDevice {
    pub fn new(camera: &CameraConfig, screen: &DisplayConfig) -> Result<Self, CameraError> {
        let style = AnnotationStyle::load(camera, screen)?;
        let sink = FramebufferSink {
            path: PathBuf::from(&screen.framebuffer),
            format: screen.pixel_format,
        };
        info!(
            rotation = camera.rotation,
            width = camera.width,
            height = camera.height,
            framebuffer = %sink.path.display(),
            "camera configured"
        );
        Ok(Self {
            config: camera.clone(),
            preview: None,
            compositor: Compositor::new(screen.width, screen.height, style, sink),
        })
    }

    /// Check that the camera stack is installed and a sensor is attached.
    pub async fn probe(config: &CameraConfig) -> Result<(), CameraError> {
        let output = Command::new(&config.preview_command)
            .arg("--list-cameras")
            .output()
            .await
            .map_err(|e| CameraError::Spawn(config.preview_command.clone(), e.to_string()))?;

        let listing = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        if !output.status.success() || listing.contains("No cameras available") {
            return Err(CameraError::Unavailable(listing.trim().to_string()));
        }
        debug!(listing = listing.trim(), "camera detected");
        Ok(())
    }

    fn common_args(&self) -> Vec<String> {
        vec![
            "--rotation".into(),
            self.config.rotation.to_string(),
            "--width".into(),
            self.config.width.to_string(),
            "--height".into(),
            self.config.height.to_string(),
        ]
    }
}

impl CameraDevice for RpicamDevice {
    async fn start_preview(&mut self) -> Result<(), CameraError> {
        if self.preview.is_some() {
            return Ok(());
        }
        let child = Command::new(&self.config.preview_command)
            .args(["-t", "0", "--fullscreen"])
            .args(self.common_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CameraError::Spawn(self.config.preview_command.clone(), e.to_string()))?;
        debug!(pid = child.id(), "preview started");
        self.preview = Some(child);
        Ok(())
    }

    async fn stop_preview(&mut self) -> Result<(), CameraError> {
        let Some(mut child) = self.preview.take() else {
            return Ok(());
        };
        // Already exited on its own: nothing left to kill.
        if let Ok(Some(status)) = child.try_wait() {
            warn!(%status, "preview had already exited");
            return Ok(());
        }
        child
            .kill()
            .await
            .map_err(|e| CameraError::Preview(e.to_string()))?;
        debug!("preview stopped");
        Ok(())
    }

    fn add_overlay(&mut self, source: PaddedImage, layer: i32) -> Result<OverlayId, CameraError> {
        self.compositor.add(source, layer)
    }

    fn set_overlay_alpha(&mut self, id: OverlayId, alpha: u8) -> Result<(), CameraError> {
        self.compositor.set_alpha(id, alpha)
    }

    fn remove_overlay(&mut self, id: OverlayId) -> Result<(), CameraError> {
        self.compositor.remove(id)
    }

    fn set_annotation(&mut self, text: &str) -> Result<(), CameraError> {
        self.compositor.set_annotation(text)
    }

    fn clear_overlays(&mut self) -> Result<usize, CameraError> {
        self.compositor.clear()
    }

    async fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        let resume_preview = self.preview.is_some();
        self.stop_preview().await?;

        let output = Command::new(&self.config.still_command)
            .args(["-n", "--immediate"])
            .args(self.common_args())
            .arg("-o")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CameraError::Spawn(self.config.still_command.clone(), e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(stderr = %stderr, path = %path.display(), "still capture exited with error");
            return Err(CameraError::Capture(stderr.into_owned()));
        }

        if resume_preview {
            self.start_preview().await?;
        }
        Ok(())
    }
}
