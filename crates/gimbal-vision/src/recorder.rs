use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

/// Writes frames as `frame_000000.png`, `frame_000001.png`, ...
#[derive(Debug)]
pub struct FrameRecorder {
    dir: PathBuf,
    next: u64,
}

impl FrameRecorder {
    /// Creates `dir` if needed.
    pub fn create(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, next: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record(&mut self, image: &RgbImage) -> Result<PathBuf, image::ImageError> {
        let path = self.dir.join(format!("frame_{:06}.png", self.next));
        image.save(&path)?;
        self.next += 1;
        Ok(path)
    }

    pub fn recorded(&self) -> u64 {
        self.next
    }
}
