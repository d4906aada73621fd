use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in integer pixel coordinates.
///
/// A rectangle with non-positive width or height is empty; the default
/// value is the empty rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const EMPTY: PixelRect = PixelRect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Clamp the origin to be non-negative and trim the extent so the
    /// rectangle ends inside a `frame_width` x `frame_height` frame.
    ///
    /// Only the far edges are trimmed; an origin pulled up to zero keeps
    /// its extent.
    pub fn clamp_to_frame(self, frame_width: u32, frame_height: u32) -> Self {
        let fw = frame_width as i32;
        let fh = frame_height as i32;
        let x = self.x.max(0);
        let y = self.y.max(0);
        let mut width = self.width;
        let mut height = self.height;
        if x + width > fw {
            width = fw - x;
        }
        if y + height > fh {
            height = fh - y;
        }
        let out = Self::new(x, y, width, height);
        if out.is_empty() {
            Self::EMPTY
        } else {
            out
        }
    }

    /// Search window for the next frame: twice the size of `self`, centered
    /// on it and clamped to the frame.
    pub fn doubled_within(self, frame_width: u32, frame_height: u32) -> Self {
        let width = self.width * 2;
        let height = self.height * 2;
        let x = self.x - (width - self.width) / 2;
        let y = self.y - (height - self.height) / 2;
        Self::new(x, y, width, height).clamp_to_frame(frame_width, frame_height)
    }

    /// Intersection with the image bounds, `None` when nothing overlaps.
    pub fn intersect_image(&self, width: u32, height: u32) -> Option<Self> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.right().min(width as i32);
        let y1 = self.bottom().min(height as i32);
        let r = Self::new(x0, y0, x1 - x0, y1 - y0);
        (!r.is_empty()).then_some(r)
    }

    /// Copy the pixels under this rectangle. Parts outside the image are
    /// dropped; `None` when the rectangle misses the image entirely.
    pub fn crop(&self, image: &RgbImage) -> Option<RgbImage> {
        let r = self.intersect_image(image.width(), image.height())?;
        Some(
            image::imageops::crop_imm(
                image,
                r.x as u32,
                r.y as u32,
                r.width as u32,
                r.height as u32,
            )
            .to_image(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubled_window_is_centered() {
        let r = PixelRect::new(100, 100, 40, 20).doubled_within(640, 480);
        assert_eq!(r, PixelRect::new(80, 90, 80, 40));
    }

    #[test]
    fn doubled_window_is_clamped_at_origin_and_far_edge() {
        let near = PixelRect::new(5, 2, 40, 20).doubled_within(640, 480);
        assert_eq!(near, PixelRect::new(0, 0, 80, 40));

        let far = PixelRect::new(600, 460, 40, 20).doubled_within(640, 480);
        assert_eq!(far, PixelRect::new(580, 450, 60, 30));
    }

    #[test]
    fn window_outside_frame_collapses_to_empty() {
        let r = PixelRect::new(700, 10, 10, 10).clamp_to_frame(640, 480);
        assert!(r.is_empty());
        assert_eq!(r, PixelRect::EMPTY);
    }

    #[test]
    fn crop_trims_to_image() {
        let img = RgbImage::from_pixel(10, 8, image::Rgb([1, 2, 3]));
        let out = PixelRect::new(6, -2, 10, 5).crop(&img).expect("overlap");
        assert_eq!((out.width(), out.height()), (4, 3));
        assert!(PixelRect::new(20, 20, 3, 3).crop(&img).is_none());
    }
}
