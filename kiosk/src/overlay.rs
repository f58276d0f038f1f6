use std::path::Path;
use std::time::Duration;

use image::{DynamicImage, RgbImage};
use tracing::{info, warn};

use crate::camera::{CameraDevice, OverlayId, PaddedImage};
use crate::error::KioskError;

/// Horizontal block size the display hardware requires.
pub const ALIGN_WIDTH: u32 = 32;
/// Vertical block size the display hardware requires.
pub const ALIGN_HEIGHT: u32 = 16;

/// An overlay on screen. The compositor supports only a few at once, so each
/// one is owned through this handle and [`hide`] consumes it, which rules
/// out double release. Dropping a handle without releasing it logs a
/// warning.
#[must_use = "an overlay stays on screen until passed to overlay::hide"]
#[derive(Debug)]
pub struct Overlay {
    id: OverlayId,
    layer: i32,
    name: String,
    released: bool,
}

impl Overlay {
    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        if !self.released {
            warn!(id = %self.id, name = self.name, "overlay dropped without release");
        }
    }
}

/// Pad `img` to the next multiple of 32x16 with black RGB pixels. The
/// image sits in the top-left corner and its size is kept as the
/// displayed region.
pub fn pad_image(img: &DynamicImage) -> PaddedImage {
    let (width, height) = (img.width(), img.height());
    let padded_width = width.div_ceil(ALIGN_WIDTH) * ALIGN_WIDTH;
    let padded_height = height.div_ceil(ALIGN_HEIGHT) * ALIGN_HEIGHT;

    let mut pad = RgbImage::new(padded_width, padded_height);
    image::imageops::replace(&mut pad, &img.to_rgb8(), 0, 0);

    PaddedImage {
        rgb: pad.into_raw(),
        padded_width,
        padded_height,
        width,
        height,
    }
}

/// Load `path` and put it on screen at `layer` until released.
pub fn show_held<C: CameraDevice>(
    camera: &mut C,
    path: &Path,
    layer: i32,
) -> Result<Overlay, KioskError> {
    let img = image::open(path).map_err(|source| KioskError::Asset {
        path: path.to_path_buf(),
        source,
    })?;
    let id = camera.add_overlay(pad_image(&img), layer)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(%id, layer, name, "created overlay");
    Ok(Overlay {
        id,
        layer,
        name,
        released: false,
    })
}

/// Show `path` at `layer`. With a non-zero `auto_duration` the overlay is
/// held for that long, released, and `None` is returned; otherwise the live
/// handle is returned for the caller to release.
pub async fn show<C: CameraDevice>(
    camera: &mut C,
    path: &Path,
    layer: i32,
    auto_duration: Duration,
) -> Result<Option<Overlay>, KioskError> {
    let overlay = show_held(camera, path, layer)?;
    if auto_duration.is_zero() {
        return Ok(Some(overlay));
    }
    tokio::time::sleep(auto_duration).await;
    hide(camera, Some(overlay))?;
    Ok(None)
}

/// Show `path` for `duration`, then release it.
pub async fn flash<C: CameraDevice>(
    camera: &mut C,
    path: &Path,
    layer: i32,
    duration: Duration,
) -> Result<(), KioskError> {
    let leftover = show(camera, path, layer, duration).await?;
    hide(camera, leftover)
}

/// Release an overlay. `None` is a no-op.
pub fn hide<C: CameraDevice>(camera: &mut C, overlay: Option<Overlay>) -> Result<(), KioskError> {
    let Some(mut overlay) = overlay else {
        return Ok(());
    };
    camera.remove_overlay(overlay.id)?;
    overlay.released = true;
    info!(
        id = %overlay.id(),
        layer = overlay.layer(),
        name = overlay.name(),
        "removed overlay"
    );
    Ok(())
}

pub fn set_alpha<C: CameraDevice>(
    camera: &mut C,
    overlay: &Overlay,
    alpha: u8,
) -> Result<(), KioskError> {
    camera.set_overlay_alpha(overlay.id, alpha)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::mock::{CameraEvent, MockCamera};
    use crate::error::FaultKind;
    use image::Rgb;
    use std::path::PathBuf;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([250, 10, 10]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn padding_rounds_up_to_alignment() {
        for (w, h, pw, ph) in [
            (1, 1, 32, 16),
            (32, 16, 32, 16),
            (33, 17, 64, 32),
            (1024, 600, 1024, 608),
            (1919, 1081, 1920, 1088),
        ] {
            let padded = pad_image(&DynamicImage::new_rgb8(w, h));
            assert_eq!((padded.padded_width, padded.padded_height), (pw, ph));
            assert_eq!((padded.width, padded.height), (w, h));
            assert_eq!(padded.rgb.len(), (pw * ph * 3) as usize);
        }
    }

    #[test]
    fn padding_keeps_image_top_left_and_fills_black() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([7, 8, 9])));
        let padded = pad_image(&img);
        let buf =
            RgbImage::from_raw(padded.padded_width, padded.padded_height, padded.rgb).unwrap();
        assert_eq!(buf.get_pixel(2, 1).0, [7, 8, 9]);
        assert_eq!(buf.get_pixel(3, 1).0, [0, 0, 0]);
        assert_eq!(buf.get_pixel(0, 2).0, [0, 0, 0]);
    }

    #[test]
    fn hiding_nothing_is_a_noop() {
        let mut camera = MockCamera::new();
        hide(&mut camera, None).unwrap();
        hide(&mut camera, None).unwrap();
        assert!(camera.events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn held_overlay_stays_until_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "intro_1.png", 50, 20);
        let mut camera = MockCamera::new();

        let overlay = show(&mut camera, &path, 3, Duration::ZERO).await.unwrap();
        let overlay = overlay.expect("zero duration keeps the overlay");
        assert_eq!(overlay.layer(), 3);
        assert_eq!(overlay.name(), "intro_1.png");
        let live = &camera.live[&overlay.id()];
        assert_eq!((live.width, live.height), (50, 20));

        let id = overlay.id();
        hide(&mut camera, Some(overlay)).unwrap();
        assert!(camera.live.is_empty());
        assert_eq!(camera.events.last(), Some(&CameraEvent::Removed(id)));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_overlay_releases_itself() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "processing.png", 10, 10);
        let mut camera = MockCamera::new();

        let start = tokio::time::Instant::now();
        let result = show(&mut camera, &path, 3, Duration::from_secs(2)).await.unwrap();
        assert!(result.is_none());
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert!(camera.live.is_empty());
        assert_eq!((camera.added(), camera.removed()), (1, 1));
    }

    #[tokio::test]
    async fn missing_image_is_an_asset_fault() {
        let dir = tempfile::tempdir().unwrap();
        let mut camera = MockCamera::new();
        let err = show(&mut camera, &dir.path().join("nope.png"), 3, Duration::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FaultKind::Asset);
        assert!(camera.events.is_empty());
    }

    #[tokio::test]
    async fn alpha_reaches_the_compositor() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "intro_2.png", 10, 10);
        let mut camera = MockCamera::new();
        let overlay = show_held(&mut camera, &path, 4).unwrap();
        set_alpha(&mut camera, &overlay, 0).unwrap();
        assert_eq!(camera.live[&overlay.id()].alpha, 0);
        hide(&mut camera, Some(overlay)).unwrap();
    }
}
