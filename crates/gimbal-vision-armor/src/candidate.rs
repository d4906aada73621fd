use gimbal_vision_core::{
    homography_from_4pt, warp_perspective_rgb, EnemyColor, PixelRect, RotatedShape,
};
use image::RgbImage;
use nalgebra::Point2;

use crate::params::{ArmorParams, GammaParams};

/// Strike priority for a classified digit; higher is more valuable.
pub fn priority_for(number: u8) -> u8 {
    match number {
        1 => 4,
        3 | 4 => 3,
        7 => 2,
        2 => 1,
        _ => 0,
    }
}

/// One matched lightbar pair, interpreted as an armor plate.
///
/// Candidates live for one frame. `number` starts at 0 (unclassified) and
/// is set by the selector; setting it also sets `priority`.
#[derive(Clone, Debug)]
pub struct ArmorCandidate {
    /// Plate rectangle with `width` as the long side.
    pub shape: RotatedShape,
    /// Perspective-rectified digit region.
    pub patch: RgbImage,
    pub color: EnemyColor,
    /// Geometric deviation, lower is better.
    pub score: f32,
    number: u8,
    priority: u8,
    valid: bool,
}

impl Default for ArmorCandidate {
    fn default() -> Self {
        Self {
            shape: RotatedShape::default(),
            patch: RgbImage::new(0, 0),
            color: EnemyColor::default(),
            score: 0.0,
            number: 0,
            priority: 0,
            valid: false,
        }
    }
}

impl ArmorCandidate {
    pub fn new(shape: RotatedShape, patch: RgbImage, color: EnemyColor, score: f32) -> Self {
        Self {
            shape,
            patch,
            color,
            score,
            number: 0,
            priority: 0,
            valid: true,
        }
    }

    /// Build a candidate from the plate shape and the four patch corners
    /// (left-up, right-up, right-down, left-down) in `image` coordinates.
    pub fn from_corners(
        image: &RgbImage,
        shape: RotatedShape,
        corners: &[Point2<f32>; 4],
        color: EnemyColor,
        score: f32,
        params: &ArmorParams,
    ) -> Self {
        let side = params.patch_size.max(1);
        let mut patch = extract_patch(image, corners, side);
        if params.gamma.enabled {
            gamma_correct(&mut patch, &params.gamma);
        }
        Self::new(shape, patch, color, score)
    }

    /// False only for the `Default` placeholder.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn set_number(&mut self, number: u8) {
        self.number = number;
        self.priority = priority_for(number);
        self.valid = true;
    }

    /// Integer box around the plate, used for the ROI window.
    pub fn bounding_rect(&self) -> PixelRect {
        self.shape.bounding_rect()
    }
}

fn extract_patch(image: &RgbImage, corners: &[Point2<f32>; 4], side: u32) -> RgbImage {
    let s = side as f32;
    let patch_corners = [
        Point2::new(0.0, 0.0),
        Point2::new(s, 0.0),
        Point2::new(s, s),
        Point2::new(0.0, s),
    ];
    match homography_from_4pt(&patch_corners, corners) {
        Some(h) => warp_perspective_rgb(image, h, side, side),
        None => RgbImage::new(side, side),
    }
}

/// In-place gamma curve on every channel.
pub fn gamma_correct(patch: &mut RgbImage, gamma: &GammaParams) {
    if gamma.c <= 0.0 || gamma.g <= 0.0 {
        return;
    }
    let lut: Vec<u8> = (0..=255u32)
        .map(|v| {
            let n = v as f32 / 255.0 / gamma.c;
            (n.powf(1.0 / gamma.g) * 255.0).clamp(0.0, 255.0) as u8
        })
        .collect();
    for p in patch.pixels_mut() {
        for c in p.0.iter_mut() {
            *c = lut[*c as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn priorities_follow_digit_table() {
        let expected = [(0, 0), (1, 4), (2, 1), (3, 3), (4, 3), (5, 0), (6, 0), (7, 2), (9, 0)];
        for (number, priority) in expected {
            assert_eq!(priority_for(number), priority, "digit {number}");
        }
    }

    #[test]
    fn placeholder_is_invalid_until_classified() {
        let mut c = ArmorCandidate::default();
        assert!(!c.is_valid());
        c.set_number(3);
        assert!(c.is_valid());
        assert_eq!(c.priority(), 3);

        let built = ArmorCandidate::new(
            RotatedShape::default(),
            RgbImage::new(1, 1),
            EnemyColor::Blue,
            0.5,
        );
        assert!(built.is_valid());
        assert_eq!(built.number(), 0);
    }

    #[test]
    fn patch_is_rectified_from_corners() {
        let image = RgbImage::from_fn(100, 100, |x, _| {
            if x < 50 {
                Rgb([10, 10, 10])
            } else {
                Rgb([240, 240, 240])
            }
        });
        let corners = [
            Point2::new(20.0, 20.0),
            Point2::new(80.0, 20.0),
            Point2::new(80.0, 80.0),
            Point2::new(20.0, 80.0),
        ];
        let shape = RotatedShape::new(Point2::new(50.0, 50.0), 60.0, 60.0, 0.0);
        let c = ArmorCandidate::from_corners(
            &image,
            shape,
            &corners,
            EnemyColor::Red,
            0.0,
            &ArmorParams::default(),
        );
        assert_eq!(c.patch.dimensions(), (28, 28));
        assert_eq!(c.patch.get_pixel(2, 14).0, [10, 10, 10]);
        assert_eq!(c.patch.get_pixel(25, 14).0, [240, 240, 240]);
    }

    #[test]
    fn gamma_brightens_dark_values() {
        let mut patch = RgbImage::from_pixel(1, 1, Rgb([64, 0, 255]));
        gamma_correct(
            &mut patch,
            &GammaParams {
                enabled: true,
                c: 1.0,
                g: 2.2,
            },
        );
        let p = patch.get_pixel(0, 0).0;
        assert!(p[0] > 64);
        assert_eq!(p[1], 0);
        assert_eq!(p[2], 255);
    }
}
