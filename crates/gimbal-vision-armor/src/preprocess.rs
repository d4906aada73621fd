use gimbal_vision_core::EnemyColor;
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;

use crate::params::ArmorParams;

/// Binary mask of bright pixels dominated by the enemy color.
///
/// A pixel is set when its luminance exceeds `grey_thresh` and the enemy
/// channel minus the opposing channel (saturating at zero) exceeds
/// `subtract_thresh`. The mask is then closed with a square kernel of side
/// `kernel_size`. The output has the size of `image`.
pub fn preprocess(image: &RgbImage, color: EnemyColor, params: &ArmorParams) -> GrayImage {
    let gray = image::imageops::grayscale(image);
    let (enemy, other) = match color {
        EnemyColor::Red => (0, 2),
        EnemyColor::Blue => (2, 0),
    };

    let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y).0;
        let bright = gray.get_pixel(x, y).0[0] > params.grey_thresh;
        let tinted = px[enemy].saturating_sub(px[other]) > params.subtract_thresh;
        Luma([if bright && tinted { 255 } else { 0 }])
    });

    // LInf radius k is a (2k + 1) square; even sizes round up
    let radius = (params.kernel_size / 2).min(u8::MAX as u32) as u8;
    if params.kernel_size < 2 || radius == 0 {
        mask
    } else {
        close(&mask, Norm::LInf, radius)
    }
}
