use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use photobooth_common::config::{CameraConfig, DisplayConfig, PixelFormat};
use tracing::debug;

use super::{CameraError, OverlayId, PaddedImage};

/// Pixels of horizontal padding on each side of the annotation text.
const ANNOTATION_MARGIN: u32 = 8;

/// Colours and font used to draw the annotation band.
pub struct AnnotationStyle {
    pub text_size: u32,
    pub background: Rgb<u8>,
    pub foreground: Rgb<u8>,
    pub font: Option<FontArc>,
}

impl AnnotationStyle {
    /// Build the style from the camera settings, loading the configured font.
    pub fn load(camera: &CameraConfig, display: &DisplayConfig) -> Result<Self, CameraError> {
        let font = match &display.font {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .map_err(|e| CameraError::Font(path.clone(), e.to_string()))?;
                let font = FontArc::try_from_vec(bytes)
                    .map_err(|e| CameraError::Font(path.clone(), e.to_string()))?;
                Some(font)
            }
            None => None,
        };
        Ok(Self {
            text_size: camera.annotate_text_size,
            background: Rgb(camera.annotate_background),
            foreground: Rgb(camera.annotate_foreground),
            font,
        })
    }
}

/// Where rendered frames go: a Linux framebuffer device (or any file).
pub struct FramebufferSink {
    pub path: PathBuf,
    pub format: PixelFormat,
}

impl FramebufferSink {
    fn write(&self, frame: &RgbaImage) -> Result<(), CameraError> {
        let bytes = match self.format {
            PixelFormat::Rgb565 => encode_rgb565(frame),
            PixelFormat::Bgra8888 => encode_bgra8888(frame),
        };
        let mut fb = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| CameraError::Display(format!("{}: {e}", self.path.display())))?;
        fb.write_all(&bytes)
            .map_err(|e| CameraError::Display(format!("{}: {e}", self.path.display())))?;
        Ok(())
    }
}

struct Layer {
    /// Visible region, already scaled to fit the screen.
    pixels: RgbImage,
    x: u32,
    y: u32,
    alpha: u8,
}

/// Stacks overlay layers and the annotation into full-screen frames.
pub struct Compositor {
    width: u32,
    height: u32,
    layers: BTreeMap<(i32, OverlayId), Layer>,
    annotation: String,
    style: AnnotationStyle,
    sink: FramebufferSink,
    next_id: u32,
}

impl Compositor {
    pub fn new(width: u32, height: u32, style: AnnotationStyle, sink: FramebufferSink) -> Self {
        Self {
            width,
            height,
            layers: BTreeMap::new(),
            annotation: String::new(),
            style,
            sink,
            next_id: 1,
        }
    }

    pub fn add(&mut self, source: PaddedImage, layer: i32) -> Result<OverlayId, CameraError> {
        let padded = RgbImage::from_raw(source.padded_width, source.padded_height, source.rgb)
            .ok_or_else(|| {
                CameraError::Display(format!(
                    "overlay buffer does not match {}x{}",
                    source.padded_width, source.padded_height
                ))
            })?;
        // Only the unpadded region is displayed.
        let visible = imageops::crop_imm(&padded, 0, 0, source.width, source.height).to_image();
        let (w, h) = fit_within(source.width, source.height, self.width, self.height);
        let pixels = if (w, h) == (source.width, source.height) {
            visible
        } else {
            imageops::resize(&visible, w, h, FilterType::Triangle)
        };

        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.layers.insert(
            (layer, id),
            Layer {
                pixels,
                x: (self.width - w) / 2,
                y: (self.height - h) / 2,
                alpha: 255,
            },
        );
        debug!(%id, layer, width = w, height = h, "overlay composited");
        self.present()?;
        Ok(id)
    }

    pub fn set_alpha(&mut self, id: OverlayId, alpha: u8) -> Result<(), CameraError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|((_, lid), _)| *lid == id)
            .map(|(_, layer)| layer)
            .ok_or(CameraError::UnknownOverlay(id))?;
        layer.alpha = alpha;
        self.present()
    }

    pub fn remove(&mut self, id: OverlayId) -> Result<(), CameraError> {
        let key = self
            .layers
            .keys()
            .find(|(_, lid)| *lid == id)
            .copied()
            .ok_or(CameraError::UnknownOverlay(id))?;
        self.layers.remove(&key);
        self.present()
    }

    pub fn clear(&mut self) -> Result<usize, CameraError> {
        let count = self.layers.len();
        if count > 0 {
            self.layers.clear();
            self.present()?;
        }
        Ok(count)
    }

    pub fn set_annotation(&mut self, text: &str) -> Result<(), CameraError> {
        if self.style.font.is_none() && !text.is_empty() {
            debug!(text, "no annotation font configured, text not drawn");
        }
        self.annotation = text.to_string();
        self.present()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Render the current stack: layers in ascending `(layer, id)` order,
    /// alpha-blended over a fully transparent canvas, then the annotation
    /// band on top. Uncovered pixels keep alpha 0 so the preview plane below
    /// shows through.
    pub fn render(&self) -> RgbaImage {
        let mut frame = RgbaImage::new(self.width, self.height);
        for layer in self.layers.values().filter(|l| l.alpha > 0) {
            for (x, y, src) in layer.pixels.enumerate_pixels() {
                let (fx, fy) = (layer.x + x, layer.y + y);
                if fx < self.width && fy < self.height {
                    blend(frame.get_pixel_mut(fx, fy), *src, layer.alpha);
                }
            }
        }
        if !self.annotation.is_empty() {
            if let Some(font) = &self.style.font {
                self.draw_annotation(&mut frame, font);
            }
        }
        frame
    }

    fn present(&self) -> Result<(), CameraError> {
        self.sink.write(&self.render())
    }

    fn draw_annotation(&self, frame: &mut RgbaImage, font: &FontArc) {
        let scale = PxScale::from(self.style.text_size as f32);
        let scaled = font.as_scaled(scale);
        let text_width: f32 = self
            .annotation
            .chars()
            .map(|c| scaled.h_advance(scaled.glyph_id(c)))
            .sum();

        let band_w = (text_width.ceil() as u32 + 2 * ANNOTATION_MARGIN).min(self.width);
        let band_h = (scaled.height().ceil() as u32).min(self.height);
        let band_x = (self.width - band_w) / 2;
        for y in 0..band_h {
            for x in band_x..band_x + band_w {
                blend(frame.get_pixel_mut(x, y), self.style.background, 255);
            }
        }

        let mut caret = band_x as f32 + ANNOTATION_MARGIN as f32;
        for c in self.annotation.chars() {
            let mut glyph = scaled.scaled_glyph(c);
            glyph.position = point(caret, scaled.ascent());
            caret += scaled.h_advance(glyph.id);
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let (width, height) = (self.width as i32, self.height as i32);
            let fg = self.style.foreground;
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px >= 0 && py >= 0 && px < width && py < height {
                    let a = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
                    blend(frame.get_pixel_mut(px as u32, py as u32), fg, a);
                }
            });
        }
    }
}

/// Largest size with the source's aspect ratio that fits the screen.
/// Images that already fit are left at their native size.
fn fit_within(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if max_w == 0 || max_h == 0 {
        return (0, 0);
    }
    if w <= max_w && h <= max_h {
        return (w, h);
    }
    let scale = f64::min(max_w as f64 / w as f64, max_h as f64 / h as f64);
    (
        ((w as f64 * scale).round() as u32).clamp(1, max_w),
        ((h as f64 * scale).round() as u32).clamp(1, max_h),
    )
}

/// Source-over blend of an opaque colour at `alpha` onto a straight-alpha
/// destination pixel.
fn blend(dst: &mut Rgba<u8>, src: Rgb<u8>, alpha: u8) {
    if alpha == 0 {
        return;
    }
    let sa = alpha as u32;
    let da = dst.0[3] as u32 * (255 - sa) / 255;
    let out_a = sa + da;
    for c in 0..3 {
        dst.0[c] = ((src.0[c] as u32 * sa + dst.0[c] as u32 * da) / out_a) as u8;
    }
    dst.0[3] = out_a as u8;
}

/// Little-endian RGB565, the native layout of most small SPI/DSI panels.
/// There is no alpha channel, so transparent pixels come out black and the
/// plane hides whatever is below it.
pub fn encode_rgb565(frame: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() / 2);
    for p in frame.pixels() {
        let [r, g, b, _] = p.0;
        let v = ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3);
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn encode_bgra8888(frame: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len());
    for p in frame.pixels() {
        let [r, g, b, a] = p.0;
        out.extend_from_slice(&[b, g, r, a]);
    }
    out
}
