use serde::{Deserialize, Serialize};

/// Digit-patch gamma correction: `v' = 255 * (v / 255 / c)^(1 / g)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GammaParams {
    pub enabled: bool,
    pub c: f32,
    /// Values above 1 brighten dark pixels.
    pub g: f32,
}

impl Default for GammaParams {
    fn default() -> Self {
        Self {
            enabled: false,
            c: 1.0,
            g: 2.2,
        }
    }
}

/// Thresholds for armor detection. Each field maps to one configuration key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmorParams {
    /// Search only around the previous target when one exists.
    pub roi_enabled: bool,
    /// Luminance cutoff (strictly greater passes).
    pub grey_thresh: u8,
    /// Cutoff on the enemy-minus-other channel difference.
    pub subtract_thresh: u8,
    /// Closing kernel side in pixels; values below 2 disable closing.
    pub kernel_size: u32,

    /// Lightbars whose rectangle area is not above this are noise.
    pub min_lightbar_area: f32,

    /// Center distance over mean lightbar height.
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    /// Left lightbar height over right lightbar height.
    pub min_length_ratio: f32,
    pub max_length_ratio: f32,
    /// Degrees.
    pub max_lightbar_delta: f32,
    /// Degrees; tilt of the line joining the two centers.
    pub max_armor_angle: f32,
    /// Degrees; mean lightbar tilt versus the joining line.
    pub max_armor_lightbar_delta: f32,
    /// Aspect ratio that scores zero.
    pub ideal_aspect_ratio: f32,

    /// Upper bound on classifier calls per frame.
    pub max_candidates: usize,
    /// Patch corners sit this many lightbar heights above and below the
    /// lightbar centers.
    pub corner_extension: f32,
    /// Side of the square digit patch, in pixels.
    pub patch_size: u32,
    pub gamma: GammaParams,
}

impl Default for ArmorParams {
    fn default() -> Self {
        Self {
            roi_enabled: true,
            grey_thresh: 100,
            subtract_thresh: 60,
            kernel_size: 3,
            min_lightbar_area: 30.0,
            min_aspect_ratio: 1.0,
            max_aspect_ratio: 5.5,
            min_length_ratio: 0.5,
            max_length_ratio: 2.0,
            max_lightbar_delta: 10.0,
            max_armor_angle: 20.0,
            max_armor_lightbar_delta: 15.0,
            ideal_aspect_ratio: 3.31,
            max_candidates: 3,
            corner_extension: 1.5,
            patch_size: 28,
            gamma: GammaParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let p: ArmorParams =
            serde_json::from_str(r#"{ "grey_thresh": 150, "gamma": { "enabled": true } }"#)
                .expect("parse");
        assert_eq!(p.grey_thresh, 150);
        assert!(p.gamma.enabled);
        assert_eq!(p.gamma.g, 2.2);
        assert_eq!(p.max_candidates, ArmorParams::default().max_candidates);
    }
}
