//! Pairwise lightbar gating and scoring.
//!
//! Each pair is reduced to five numbers ([`PairMetrics`]). A pair is
//! accepted only when all five fall inside their windows; the score sums
//! five penalties, each scaled so that reaching the edge of its window
//! costs 10.

use gimbal_vision_core::{min_area_rect, EnemyColor, RotatedShape};
use image::RgbImage;
use nalgebra::Point2;

use crate::candidate::ArmorCandidate;
use crate::params::ArmorParams;

/// Geometry of one lightbar pair (left, right).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairMetrics {
    /// Center distance over mean height.
    pub aspect_ratio: f32,
    /// Left height over right height.
    pub length_ratio: f32,
    /// Absolute tilt difference of the two bars, degrees.
    pub lightbar_delta: f32,
    /// Tilt of the line joining the centers, degrees in (-90, 90).
    pub armor_angle: f32,
    /// Mean bar tilt versus `armor_angle`, degrees.
    pub armor_lightbar_delta: f32,
}

impl PairMetrics {
    pub fn measure(left: &RotatedShape, right: &RotatedShape) -> Self {
        let d = right.center - left.center;
        let separation = d.norm();
        let mean_height = 0.5 * (left.height + right.height);
        let armor_angle = (d.y / d.x).atan().to_degrees();
        Self {
            aspect_ratio: separation / mean_height,
            length_ratio: left.height / right.height,
            lightbar_delta: (left.angle - right.angle).abs(),
            armor_angle,
            armor_lightbar_delta: (0.5 * (left.angle + right.angle) - armor_angle).abs(),
        }
    }

    /// All five gates hold. Non-finite metrics never pass.
    pub fn accepts(&self, p: &ArmorParams) -> bool {
        self.aspect_ratio > p.min_aspect_ratio
            && self.aspect_ratio < p.max_aspect_ratio
            && self.length_ratio > p.min_length_ratio
            && self.length_ratio < p.max_length_ratio
            && self.lightbar_delta < p.max_lightbar_delta
            && self.armor_angle.abs() < p.max_armor_angle
            && self.armor_lightbar_delta < p.max_armor_lightbar_delta
    }

    /// Non-negative deviation from the ideal pair; 0 is a perfect match.
    pub fn score(&self, p: &ArmorParams) -> f32 {
        let aspect = (self.aspect_ratio - p.ideal_aspect_ratio).abs() * 10.0 / p.ideal_aspect_ratio;
        let length = if self.length_ratio > 1.0 {
            (self.length_ratio - 1.0) * 10.0 / (p.max_length_ratio - 1.0)
        } else {
            (1.0 - self.length_ratio) * 10.0 / (1.0 - p.min_length_ratio)
        };
        aspect
            + length
            + self.lightbar_delta * 10.0 / p.max_lightbar_delta
            + self.armor_angle.abs() * 10.0 / p.max_armor_angle
            + self.armor_lightbar_delta * 10.0 / p.max_armor_lightbar_delta
    }
}

/// Patch corners: each lightbar center moved up and down along the image
/// y axis by `extension` lightbar heights. Order: left-up, right-up,
/// right-down, left-down.
fn patch_corners(left: &RotatedShape, right: &RotatedShape, extension: f32) -> [Point2<f32>; 4] {
    let l = left.center;
    let r = right.center;
    let dl = extension * left.height;
    let dr = extension * right.height;
    [
        Point2::new(l.x, l.y - dl),
        Point2::new(r.x, r.y - dr),
        Point2::new(r.x, r.y + dr),
        Point2::new(l.x, l.y + dl),
    ]
}

/// Pair every two lightbars (sorted left to right) and build a candidate
/// for each accepted pair. `image` is the frame region the lightbars were
/// found in.
pub fn match_lightbars(
    lightbars: &[RotatedShape],
    color: EnemyColor,
    image: &RgbImage,
    params: &ArmorParams,
) -> Vec<ArmorCandidate> {
    let mut armors = Vec::new();
    for (i, left) in lightbars.iter().enumerate() {
        for right in &lightbars[i + 1..] {
            let metrics = PairMetrics::measure(left, right);
            if !metrics.accepts(params) {
                log::trace!("pair rejected: {metrics:?}");
                continue;
            }

            let mut outline = Vec::with_capacity(8);
            outline.extend_from_slice(&left.corners());
            outline.extend_from_slice(&right.corners());
            let Some(plate) = min_area_rect(&outline) else {
                continue;
            };

            let corners = patch_corners(left, right, params.corner_extension);
            armors.push(ArmorCandidate::from_corners(
                image,
                plate.into_landscape(),
                &corners,
                color,
                metrics.score(params),
                params,
            ));
        }
    }
    armors
}
