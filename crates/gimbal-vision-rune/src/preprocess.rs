use gimbal_vision_core::EnemyColor;
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate, open};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::params::RuneParams;

/// Inverted color mask: 0 where the enemy channel exceeds the other by more
/// than the color's cutoff, 255 elsewhere; opened with a 3x3 square.
///
/// Lit strokes are therefore holes in a white field, and the dark areas
/// they enclose (panel interiors) are white islands.
pub fn segment(image: &RgbImage, color: EnemyColor, params: &RuneParams) -> GrayImage {
    let (enemy, other, thresh) = match color {
        EnemyColor::Red => (0, 2, params.red_thresh),
        EnemyColor::Blue => (2, 0, params.blue_thresh),
    };
    let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y).0;
        let lit = px[enemy].saturating_sub(px[other]) > thresh;
        Luma([if lit { 0 } else { 255 }])
    });
    open(&mask, Norm::LInf, 1)
}

/// Keep only white regions enclosed by lit strokes, grown back to the size
/// of their enclosing stroke.
///
/// The white component touching the top-left pixel (the open background)
/// is erased, then the rest is closed and dilated twice with a 5x5 square.
pub fn recover_panels(mask: &GrayImage) -> GrayImage {
    let mut enclosed = open(mask, Norm::LInf, 1);
    erase_component_at_origin(&mut enclosed);
    let closed = close(&enclosed, Norm::LInf, 2);
    let grown = dilate(&closed, Norm::LInf, 2);
    dilate(&grown, Norm::LInf, 2)
}

fn erase_component_at_origin(mask: &mut GrayImage) {
    if mask.width() == 0 || mask.height() == 0 || mask.get_pixel(0, 0).0[0] == 0 {
        return;
    }
    let labels = connected_components(&*mask, Connectivity::Four, Luma([0u8]));
    let seed = labels.get_pixel(0, 0).0[0];
    for (px, label) in mask.pixels_mut().zip(labels.pixels()) {
        if label.0[0] == seed {
            *px = Luma([0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn lit_pixels_become_black() {
        let mut img = RgbImage::new(12, 12);
        for y in 3..9 {
            for x in 3..9 {
                img.put_pixel(x, y, Rgb([200, 30, 40]));
            }
        }
        let params = RuneParams::default();
        let red = segment(&img, EnemyColor::Red, &params);
        assert_eq!(red.get_pixel(5, 5).0[0], 0);
        assert_eq!(red.get_pixel(0, 0).0[0], 255);

        let blue = segment(&img, EnemyColor::Blue, &params);
        assert!(blue.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn blue_uses_its_own_cutoff() {
        // difference of 70 passes the red cutoff but not the blue one
        let img = RgbImage::from_pixel(6, 6, Rgb([10, 0, 80]));
        let params = RuneParams::default();
        assert!(segment(&img, EnemyColor::Blue, &params)
            .pixels()
            .all(|p| p.0[0] == 255));
    }

    #[test]
    fn only_enclosed_regions_survive_recovery() {
        // white field with a black ring; the ring's inside is an island
        let mut mask = GrayImage::from_pixel(60, 60, Luma([255]));
        for y in 10..40 {
            for x in 10..30 {
                let ring = x < 14 || x >= 26 || y < 14 || y >= 36;
                if ring {
                    mask.put_pixel(x, y, Luma([0]));
                }
            }
        }
        let out = recover_panels(&mask);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(55, 55).0[0], 0);
        assert_eq!(out.get_pixel(20, 25).0[0], 255);
        // grown over the ring
        assert_eq!(out.get_pixel(11, 25).0[0], 255);
    }
}
