use std::path::PathBuf;

/// The fixed set of guidance images shipped next to the binary.
#[derive(Debug, Clone)]
pub struct Assets {
    dir: PathBuf,
}

impl Assets {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// `intro_1` is the steady attract image, `intro_2` the one that blinks.
    pub fn intro(&self, n: u32) -> PathBuf {
        self.dir.join(format!("intro_{n}.png"))
    }

    pub fn get_ready(&self, shot: u32) -> PathBuf {
        self.dir.join(format!("get_ready_{shot}.png"))
    }

    pub fn processing(&self) -> PathBuf {
        self.dir.join("processing.png")
    }

    pub fn all_done(&self) -> PathBuf {
        self.dir.join("all_done.png")
    }
}
