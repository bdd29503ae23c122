use std::fs;
use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;

use crate::layout::TextFace;

/// TrueType/OpenType font rasterised with `ab_glyph`.
pub struct Typeface {
    font: FontVec,
}

impl Typeface {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("font: read {}", path.display()))?;
        Self::from_bytes(data).with_context(|| format!("font: load {}", path.display()))
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(data).map_err(|err| anyhow!("font: invalid data: {err}"))?;
        Ok(Self { font })
    }
}

impl TextFace for Typeface {
    fn line_width(&self, line: &str, size: u32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size as f32));
        let mut width = 0.0;
        let mut previous = None;
        for ch in line.chars() {
            let glyph = scaled.glyph_id(ch);
            if let Some(previous) = previous {
                width += scaled.kern(previous, glyph);
            }
            width += scaled.h_advance(glyph);
            previous = Some(glyph);
        }
        width
    }

    fn line_height(&self, size: u32) -> f32 {
        self.font.as_scaled(PxScale::from(size as f32)).height()
    }

    fn draw_line(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, size: u32, line: &str) {
        draw_text_mut(canvas, color, x, y, PxScale::from(size as f32), &self.font, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn bundled() -> Typeface {
        Typeface::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("fonts/DejaVuSans.ttf"))
            .unwrap()
    }

    /// Bounding box of every non-white pixel as `(min_x, min_y, max_x, max_y)`.
    fn ink_bounds(canvas: &RgbImage) -> Option<(u32, u32, u32, u32)> {
        canvas
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel.0 != [255, 255, 255])
            .fold(None, |acc, (x, y, _)| match acc {
                None => Some((x, y, x, y)),
                Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
            })
    }

    #[test]
    fn width_grows_with_size_and_text() {
        let face = bundled();
        assert_eq!(face.line_width("", 20), 0.0);
        assert!(face.line_width("goat", 20) > face.line_width("goat", 10));
        assert!(face.line_width("goats on a hill", 12) > face.line_width("goats", 12));
        assert!(face.line_height(10) > 0.0);
        assert!(face.line_height(20) > face.line_height(10));
    }

    #[test]
    fn drawn_line_stays_within_its_line_box() {
        let face = bundled();
        let mut canvas = RgbImage::from_pixel(120, 60, Rgb([255, 255, 255]));
        let (x, y, size) = (10, 15, 20);
        face.draw_line(&mut canvas, Rgb([0, 0, 0]), x, y, size, "Hgjy");

        let (min_x, min_y, max_x, max_y) = ink_bounds(&canvas).expect("some ink");
        let bottom = y as f32 + face.line_height(size).ceil();
        let right = x as f32 + face.line_width("Hgjy", size).ceil();
        assert!(min_y >= y as u32, "ink starts at {min_y}");
        assert!((max_y as f32) < bottom + 1.0, "ink ends at {max_y}, box ends at {bottom}");
        assert!(min_x + 1 >= x as u32, "ink starts at x {min_x}");
        assert!((max_x as f32) < right + 1.0, "ink ends at x {max_x}, box ends at {right}");
    }

    #[test]
    fn rejects_non_font_bytes() {
        assert!(Typeface::from_bytes(b"definitely not a font".to_vec()).is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.otf");
        let err = Typeface::load(&path).err().unwrap();
        assert!(format!("{err:#}").contains("missing.otf"));
    }
}
