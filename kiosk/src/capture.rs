use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::camera::CameraDevice;
use crate::error::KioskError;
use crate::session::Session;

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Annotation shown for countdown number `n`, pushed right of the preview's
/// centre line.
pub fn countdown_text(n: u32) -> String {
    format!("             ...{n}")
}

/// Count down `countdown` seconds on screen, then expose shot `index` of the
/// session. A failed exposure is not retried.
pub async fn take_photo<C: CameraDevice>(
    camera: &mut C,
    session: &Session,
    index: u32,
    countdown: u32,
) -> Result<PathBuf, KioskError> {
    let path = session.photo_path(index);
    for n in (1..=countdown).rev() {
        camera.set_annotation(&countdown_text(n))?;
        tokio::time::sleep(COUNTDOWN_TICK).await;
    }
    camera.set_annotation("")?;
    camera.capture(&path).await?;
    info!(index, path = %path.display(), "photo saved");
    Ok(path)
}
