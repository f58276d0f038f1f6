use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub gpio: GpioConfig,
    #[serde(default)]
    pub booth: BoothConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_rotation")]
    pub rotation: u32,
    #[serde(default = "default_capture_width")]
    pub width: u32,
    #[serde(default = "default_capture_height")]
    pub height: u32,
    #[serde(default = "default_annotate_text_size")]
    pub annotate_text_size: u32,
    #[serde(default = "default_annotate_background")]
    pub annotate_background: [u8; 3],
    #[serde(default = "default_annotate_foreground")]
    pub annotate_foreground: [u8; 3],
    #[serde(default = "default_preview_command")]
    pub preview_command: String,
    #[serde(default = "default_still_command")]
    pub still_command: String,
}

/// Pixel layout of the framebuffer device the overlays are rendered to.
/// `bgra8888` carries alpha, so the plane can sit above the live preview.
/// `rgb565` has none and suits a display that shows only the overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgb565,
    Bgra8888,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_screen_width")]
    pub width: u32,
    #[serde(default = "default_screen_height")]
    pub height: u32,
    #[serde(default = "default_framebuffer")]
    pub framebuffer: String,
    #[serde(default = "default_pixel_format")]
    pub pixel_format: PixelFormat,
    /// TrueType font used for the countdown annotation. Without one the
    /// annotation is only logged.
    #[serde(default)]
    pub font: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GpioConfig {
    #[serde(default = "default_trigger_pin")]
    pub trigger_pin: u8,
    #[serde(default = "default_indicator_pin")]
    pub indicator_pin: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoothConfig {
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    #[serde(default = "default_media_root")]
    pub media_root: String,
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: String,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default = "default_blink_ticks")]
    pub blink_ticks: u32,
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,
    #[serde(default = "default_screen_secs")]
    pub screen_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            rotation: default_rotation(),
            width: default_capture_width(),
            height: default_capture_height(),
            annotate_text_size: default_annotate_text_size(),
            annotate_background: default_annotate_background(),
            annotate_foreground: default_annotate_foreground(),
            preview_command: default_preview_command(),
            still_command: default_still_command(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
            framebuffer: default_framebuffer(),
            pixel_format: default_pixel_format(),
            font: None,
        }
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            trigger_pin: default_trigger_pin(),
            indicator_pin: default_indicator_pin(),
        }
    }
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            media_root: default_media_root(),
            fallback_dir: default_fallback_dir(),
            poll_timeout_ms: default_poll_timeout_ms(),
            blink_ticks: default_blink_ticks(),
            countdown_secs: default_countdown_secs(),
            screen_secs: default_screen_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "display size {}x{} must be non-zero",
                self.display.width, self.display.height
            )));
        }
        Ok(())
    }

    /// Like [`Config::load`], but a missing file yields the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::ReadFile(_, e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }
}

impl BoothConfig {
    pub fn assets_path(&self, program_dir: &Path) -> PathBuf {
        program_dir.join(&self.assets_dir)
    }

    pub fn fallback_path(&self, program_dir: &Path) -> PathBuf {
        program_dir.join(&self.fallback_dir)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_rotation() -> u32 {
    180
}
fn default_capture_width() -> u32 {
    1920
}
fn default_capture_height() -> u32 {
    1120
}
fn default_annotate_text_size() -> u32 {
    100
}
fn default_annotate_background() -> [u8; 3] {
    [0, 0, 255]
}
fn default_annotate_foreground() -> [u8; 3] {
    [255, 255, 0]
}
fn default_preview_command() -> String {
    "rpicam-hello".into()
}
fn default_still_command() -> String {
    "rpicam-still".into()
}
fn default_screen_width() -> u32 {
    1024
}
fn default_screen_height() -> u32 {
    600
}
fn default_framebuffer() -> String {
    "/dev/fb0".into()
}
fn default_pixel_format() -> PixelFormat {
    PixelFormat::Bgra8888
}
fn default_trigger_pin() -> u8 {
    17
}
fn default_indicator_pin() -> u8 {
    27
}
fn default_assets_dir() -> String {
    "Assets".into()
}
fn default_media_root() -> String {
    "/media/pi".into()
}
fn default_fallback_dir() -> String {
    "photobooth".into()
}
fn default_poll_timeout_ms() -> u64 {
    100
}
fn default_blink_ticks() -> u32 {
    10
}
fn default_countdown_secs() -> u32 {
    3
}
fn default_screen_secs() -> u64 {
    2
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_file() -> String {
    "photobooth.log".into()
}
