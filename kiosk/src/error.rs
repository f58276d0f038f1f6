use std::fmt;
use std::path::PathBuf;

use crate::camera::CameraError;

/// Everything that can end a kiosk run. There is no local recovery: all of
/// these propagate to `main`, which logs the kind and runs the shared cleanup.
#[derive(Debug, thiserror::Error)]
pub enum KioskError {
    #[error("startup fault: {0}")]
    Startup(String),
    #[error("asset fault: failed to load {}: {source}", .path.display())]
    Asset {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("storage fault: cannot create {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("capture fault: {0}")]
    Capture(#[from] CameraError),
    #[error("interrupted by {0}")]
    Interrupted(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Startup,
    Asset,
    Storage,
    Capture,
    Interrupted,
}

impl KioskError {
    pub fn kind(&self) -> FaultKind {
        match self {
            KioskError::Startup(_) => FaultKind::Startup,
            KioskError::Asset { .. } => FaultKind::Asset,
            KioskError::Storage { .. } => FaultKind::Storage,
            KioskError::Capture(_) => FaultKind::Capture,
            KioskError::Interrupted(_) => FaultKind::Interrupted,
        }
    }

    /// Process exit status: an operator stop is a clean exit, everything
    /// else is a crash so the supervisor restarts the kiosk.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            FaultKind::Interrupted => 0,
            _ => 1,
        }
    }
}

impl From<rppal::gpio::Error> for KioskError {
    fn from(e: rppal::gpio::Error) -> Self {
        KioskError::Startup(format!("gpio: {e}"))
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaultKind::Startup => "startup",
            FaultKind::Asset => "asset",
            FaultKind::Storage => "storage",
            FaultKind::Capture => "capture",
            FaultKind::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}
