use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::CameraError;

/// Acquisition settings handed to [`Camera::open`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub width: u32,
    pub height: u32,
    /// Exposure time, microseconds.
    pub exposure: u32,
    pub frame_rate: f64,
    pub gamma: f64,
    pub contrast: i32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            exposure: 1000,
            frame_rate: 210.0,
            gamma: 1.0,
            contrast: 100,
        }
    }
}

/// Frame source.
pub trait Camera: Send {
    fn open(&mut self, settings: &CameraSettings) -> Result<(), CameraError>;

    fn is_open(&self) -> bool;

    /// Next frame. Fails with [`CameraError::NotOpen`] before `open`.
    fn grab(&mut self) -> Result<RgbImage, CameraError>;

    fn close(&mut self);
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn open(&mut self, settings: &CameraSettings) -> Result<(), CameraError> {
        (**self).open(settings)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn grab(&mut self) -> Result<RgbImage, CameraError> {
        (**self).grab()
    }

    fn close(&mut self) {
        (**self).close()
    }
}
