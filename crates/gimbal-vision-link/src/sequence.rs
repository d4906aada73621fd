use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::camera::{Camera, CameraSettings};
use crate::error::CameraError;

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Replays a directory of still images in file-name order.
#[derive(Debug)]
pub struct ImageSequenceCamera {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    open: bool,
}

impl ImageSequenceCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            next: 0,
            open: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.files.len().saturating_sub(self.next)
    }
}

impl Camera for ImageSequenceCamera {
    /// The directory is listed on the first open only; reopening resumes
    /// where the previous session stopped.
    fn open(&mut self, settings: &CameraSettings) -> Result<(), CameraError> {
        if self.files.is_empty() {
            self.files = list_images(&self.dir)?;
            log::info!(
                "replaying {} frames from {} (requested {}x{})",
                self.files.len(),
                self.dir.display(),
                settings.width,
                settings.height
            );
        } else {
            log::debug!(
                "resuming {} at frame {}/{}",
                self.dir.display(),
                self.next,
                self.files.len()
            );
        }
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn grab(&mut self) -> Result<RgbImage, CameraError> {
        if !self.open {
            return Err(CameraError::NotOpen);
        }
        let path = self.files.get(self.next).ok_or(CameraError::Exhausted)?;
        self.next += 1;
        let img = image::open(path).map_err(|source| CameraError::Decode {
            path: path.clone(),
            source,
        })?;
        Ok(img.to_rgb8())
    }

    fn close(&mut self) {
        self.open = false;
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
    let entries =
        fs::read_dir(dir).map_err(|e| CameraError::Open(format!("{}: {e}", dir.display())))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    if files.is_empty() {
        return Err(CameraError::Open(format!("no images in {}", dir.display())));
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn frames_come_back_sorted_then_exhaust() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (name, shade) in [("0002.png", 20u8), ("0001.png", 10), ("0003.png", 30)] {
            RgbImage::from_pixel(4, 3, Rgb([shade, 0, 0]))
                .save(dir.path().join(name))
                .expect("write");
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let mut cam = ImageSequenceCamera::new(dir.path());
        assert!(matches!(cam.grab(), Err(CameraError::NotOpen)));
        cam.open(&CameraSettings::default()).expect("open");
        assert_eq!(cam.remaining(), 3);

        let shades: Vec<u8> = (0..3)
            .map(|_| cam.grab().expect("frame").get_pixel(0, 0)[0])
            .collect();
        assert_eq!(shades, vec![10, 20, 30]);
        assert!(matches!(cam.grab(), Err(CameraError::Exhausted)));
    }

    #[test]
    fn reopening_resumes_after_a_bad_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        RgbImage::from_pixel(4, 3, Rgb([10, 0, 0]))
            .save(dir.path().join("0001.png"))
            .expect("write");
        std::fs::write(dir.path().join("0002.png"), b"not a png").expect("write");
        RgbImage::from_pixel(4, 3, Rgb([30, 0, 0]))
            .save(dir.path().join("0003.png"))
            .expect("write");

        let mut cam = ImageSequenceCamera::new(dir.path());
        cam.open(&CameraSettings::default()).expect("open");
        assert_eq!(cam.grab().expect("frame").get_pixel(0, 0)[0], 10);
        assert!(matches!(cam.grab(), Err(CameraError::Decode { .. })));

        cam.close();
        cam.open(&CameraSettings::default()).expect("reopen");
        assert_eq!(cam.remaining(), 1);
        assert_eq!(cam.grab().expect("frame").get_pixel(0, 0)[0], 30);
        assert!(matches!(cam.grab(), Err(CameraError::Exhausted)));
    }

    #[test]
    fn empty_directory_fails_to_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cam = ImageSequenceCamera::new(dir.path());
        assert!(matches!(
            cam.open(&CameraSettings::default()),
            Err(CameraError::Open(_))
        ));
        assert!(!cam.is_open());
    }
}
