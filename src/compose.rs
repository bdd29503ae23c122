//! Frame composition: background, square thumbnail, optional foreground layer
//! and the fitted caption.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, RgbaImage};
use rand::Rng;

use crate::config::{Background, Config, Rect};
use crate::layout::{self, SizeRange, TextBox, TextFace};

/// Frame geometry and styling, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub thumb_width: u32,
    pub thumb_x: i32,
    pub thumb_y: i32,
    pub caption: Rect,
    pub sizes: SizeRange,
    pub line_spacing: u32,
    pub text_color: Rgb<u8>,
    pub background: Background,
}

impl Layout {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            width: cfg.display.width,
            height: cfg.display.height,
            thumb_width: cfg.thumb_width(),
            thumb_x: cfg.layout.thumb_x,
            thumb_y: cfg.layout.thumb_y,
            caption: cfg.layout.caption,
            sizes: SizeRange {
                max: cfg.layout.font_size_max,
                min: cfg.layout.font_size_min,
            },
            line_spacing: cfg.layout.line_spacing,
            text_color: Rgb(cfg.layout.text_color),
            background: cfg.layout.background.clone(),
        }
    }
}

pub struct Composer {
    layout: Layout,
    face: Arc<dyn TextFace>,
    foreground: Option<RgbaImage>,
}

impl Composer {
    pub fn new(layout: Layout, face: Arc<dyn TextFace>) -> Self {
        Self {
            layout,
            face,
            foreground: None,
        }
    }

    /// Layer drawn over the thumbnail and under the caption, e.g. a speech bubble.
    pub fn with_foreground(mut self, foreground: RgbaImage) -> Self {
        self.foreground = Some(foreground);
        self
    }

    pub fn compose(&self, source: &DynamicImage, caption: &str) -> RgbImage {
        let layout = &self.layout;
        let mut frame = background(
            layout.width,
            layout.height,
            &layout.background,
            &mut rand::thread_rng(),
        );

        let thumb = thumbnail(source, layout.thumb_width);
        imageops::replace(
            &mut frame,
            &thumb,
            i64::from(layout.thumb_x),
            i64::from(layout.thumb_y),
        );

        if let Some(foreground) = &self.foreground {
            frame = layer_over(frame, foreground);
        }

        self.draw_caption(&mut frame, caption);
        frame
    }

    fn draw_caption(&self, frame: &mut RgbImage, caption: &str) {
        let layout = &self.layout;
        let face = self.face.as_ref();
        let area = layout.caption;
        let spacing = layout.line_spacing as f32;
        let fitted = layout::fit(
            caption,
            face,
            TextBox {
                width: area.width as f32,
                height: area.height as f32,
                line_spacing: spacing,
            },
            layout.sizes,
        );

        let line_height = face.line_height(fitted.size);
        let block = layout::block_height(&fitted.text, face, fitted.size, spacing);
        let center_x = area.x as f32 + area.width as f32 / 2.0;
        let top = area.y as f32 + (area.height as f32 - block) / 2.0;

        for (i, line) in fitted.lines().enumerate() {
            let width = face.line_width(line, fitted.size);
            let x = (center_x - width / 2.0).round() as i32;
            let y = (top + i as f32 * (line_height + spacing)).round() as i32;
            face.draw_line(frame, layout.text_color, x, y, fitted.size, line);
        }
    }
}

/// Caption shown under a picture; blank alt text gets the placeholder phrase.
pub fn caption_text(description: Option<&str>, author: &str, placeholder: &str) -> String {
    let alt = description
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .unwrap_or(placeholder);
    format!("{alt} wrote {author}")
}

/// Largest centered square of the image.
pub fn crop_to_square(image: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    image.crop_imm((width - side) / 2, (height - side) / 2, side, side)
}

/// Square thumbnail of `side` pixels, resampled with Lanczos3.
pub fn thumbnail(image: &DynamicImage, side: u32) -> RgbImage {
    let square = crop_to_square(image).to_rgb8();
    imageops::resize(&square, side, side, FilterType::Lanczos3)
}

pub fn background<R: Rng>(width: u32, height: u32, background: &Background, rng: &mut R) -> RgbImage {
    match background {
        Background::Solid { color } => RgbImage::from_pixel(width, height, Rgb(*color)),
        Background::Gradient { from, to } => diagonal_gradient(width, height, *from, *to),
        Background::RandomGradient => {
            let from = hue_to_rgb(rng.gen_range(0.0..360.0));
            let to = hue_to_rgb(rng.gen_range(0.0..360.0));
            diagonal_gradient(width, height, from, to)
        }
    }
}

/// Blend from the top-left corner to the bottom-right one.
fn diagonal_gradient(width: u32, height: u32, from: [u8; 3], to: [u8; 3]) -> RgbImage {
    let span = (width + height).saturating_sub(2).max(1) as f32;
    RgbImage::from_fn(width, height, |x, y| {
        let t = (x + y) as f32 / span;
        Rgb([
            lerp(from[0], to[0], t),
            lerp(from[1], to[1], t),
            lerp(from[2], to[2], t),
        ])
    })
}

fn lerp(from: u8, to: u8, t: f32) -> u8 {
    (from as f32 + (to as f32 - from as f32) * t)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Fully saturated, half-lightness colour for `hue` in degrees.
fn hue_to_rgb(hue: f32) -> [u8; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    [
        (r * 255.0_f32).round() as u8,
        (g * 255.0_f32).round() as u8,
        (b * 255.0_f32).round() as u8,
    ]
}

/// Alpha-blends `layer` onto the frame from the top-left corner.
fn layer_over(frame: RgbImage, layer: &RgbaImage) -> RgbImage {
    let mut layered = DynamicImage::ImageRgb8(frame).into_rgba8();
    imageops::overlay(&mut layered, layer, 0, 0);
    DynamicImage::ImageRgba8(layered).into_rgb8()
}
