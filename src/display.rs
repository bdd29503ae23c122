use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use image::{ImageFormat, RgbImage};
use tempfile::NamedTempFile;

/// A panel that takes whole frames at a fixed resolution.
pub trait Display: Send {
    fn resolution(&self) -> (u32, u32);
    /// Blocks until the panel has finished refreshing.
    fn show(&mut self, frame: &RgbImage) -> Result<()>;
}

/// Writes every frame to a PNG file; the file is replaced atomically so a
/// panel driver watching it never reads a half-written frame.
pub struct PngDisplay {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl PngDisplay {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for PngDisplay {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        ensure!(
            frame.dimensions() == self.resolution(),
            "display: frame is {:?}, panel is {:?}",
            frame.dimensions(),
            self.resolution()
        );

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("display: create directory {}", dir.display()))?;

        let mut file = NamedTempFile::new_in(&dir).context("display: create temp file")?;
        frame
            .write_to(&mut file, ImageFormat::Png)
            .context("display: encode png")?;
        file.persist(&self.path)
            .with_context(|| format!("display: write {}", self.path.display()))?;
        Ok(())
    }
}
