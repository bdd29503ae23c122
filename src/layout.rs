//! Caption layout: word wrapping and picking the largest font size that fits.
//!
//! Rendered height shrinks monotonically as the size goes down, so a plain
//! descending scan returns the largest fitting size.

use image::{Rgb, RgbImage};

/// A font that can measure and draw single lines at integer pixel sizes.
pub trait TextFace: Send + Sync {
    /// Advance width of `line` at `size`, in pixels.
    fn line_width(&self, line: &str, size: u32) -> f32;
    /// Height of one line at `size`, in pixels.
    fn line_height(&self, size: u32) -> f32;
    /// Draws `line` with its top-left corner at `(x, y)`.
    fn draw_line(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, size: u32, line: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    pub max: u32,
    pub min: u32,
}

impl Default for SizeRange {
    fn default() -> Self {
        Self { max: 20, min: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub width: f32,
    pub height: f32,
    pub line_spacing: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontFit {
    pub size: u32,
    pub text: String,
}

impl FontFit {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

/// Greedy word wrap at `size`. Words are never split; a word wider than the
/// box gets a line of its own.
pub fn wrap(text: &str, face: &dyn TextFace, size: u32, max_width: f32) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if face.line_width(&candidate, size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines.join("\n")
}

/// Height of a wrapped block, including the spacing between lines.
pub fn block_height(text: &str, face: &dyn TextFace, size: u32, line_spacing: f32) -> f32 {
    let count = text.split('\n').count() as f32;
    count * face.line_height(size) + (count - 1.0) * line_spacing
}

pub fn fit(text: &str, face: &dyn TextFace, text_box: TextBox, sizes: SizeRange) -> FontFit {
    // An inverted range never enters the loop; it still gets a layout at `min`.
    let mut best = FontFit {
        size: sizes.min,
        text: wrap(text, face, sizes.min, text_box.width),
    };
    for size in (sizes.min..=sizes.max).rev() {
        let wrapped = wrap(text, face, size, text_box.width);
        let height = block_height(&wrapped, face, size, text_box.line_spacing);
        best = FontFit {
            size,
            text: wrapped,
        };
        if height < text_box.height {
            break;
        }
    }
    best
}
