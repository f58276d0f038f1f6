pub mod blink;
pub mod state;

use std::path::PathBuf;

use photobooth_common::photo::{photo_file_name, SHOTS_PER_SESSION};

pub use state::{Kiosk, KioskSettings};

/// One button press worth of photos: where they go and the stem they share.
#[derive(Debug, Clone)]
pub struct Session {
    pub dir: PathBuf,
    pub stem: String,
}

impl Session {
    pub fn new(dir: PathBuf, stem: String) -> Self {
        Self { dir, stem }
    }

    pub fn photo_path(&self, index: u32) -> PathBuf {
        self.dir.join(photo_file_name(&self.stem, index))
    }

    /// Paths of all photos of the session, in shot order.
    pub fn photo_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        (1..=SHOTS_PER_SESSION).map(|i| self.photo_path(i))
    }
}
