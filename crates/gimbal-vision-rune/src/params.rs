use gimbal_vision_core::HalfSize;
use serde::{Deserialize, Serialize};

/// Rune segmentation and search settings.
///
/// Areas are contour areas in pixels; ratios are long side over short side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuneParams {
    /// Red-minus-blue cutoff when the enemy is red.
    pub red_thresh: u8,
    /// Blue-minus-red cutoff when the enemy is blue.
    pub blue_thresh: u8,

    pub min_panel_area: f32,
    pub max_panel_area: f32,
    pub min_panel_ratio: f32,
    pub max_panel_ratio: f32,

    pub min_fan_area: f32,
    pub max_fan_area: f32,
    pub min_fan_ratio: f32,
    pub max_fan_ratio: f32,

    pub min_marker_area: f32,
    pub max_marker_area: f32,
    /// Side of the square searched for the marker, in pixels.
    pub marker_window: u32,

    /// Pixel distance from panel center to hub.
    pub radius: f32,

    pub panel_size: HalfSize,
    pub marker_size: HalfSize,
    /// Camera-to-turret offset applied to rune poses, millimeters.
    pub pose_offset: [f64; 3],
}

impl Default for RuneParams {
    fn default() -> Self {
        Self {
            red_thresh: 50,
            blue_thresh: 90,
            min_panel_area: 1000.0,
            max_panel_area: 8000.0,
            min_panel_ratio: 1.2,
            max_panel_ratio: 3.0,
            min_fan_area: 1200.0,
            max_fan_area: 6000.0,
            min_fan_ratio: 3.0,
            max_fan_ratio: 8.0,
            min_marker_area: 30.0,
            max_marker_area: 400.0,
            marker_window: 40,
            radius: 170.0,
            panel_size: HalfSize::new(115.0, 63.5),
            marker_size: HalfSize::new(25.0, 25.0),
            pose_offset: [0.0, -49.19, 115.62],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let p: RuneParams =
            serde_json::from_str(r#"{ "blue_thresh": 120, "marker_window": 60 }"#).expect("parse");
        let d = RuneParams::default();
        assert_eq!(p.blue_thresh, 120);
        assert_eq!(p.marker_window, 60);
        assert_eq!(p.red_thresh, d.red_thresh);
        assert_eq!(p.panel_size, d.panel_size);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let p: RuneParams =
            serde_json::from_str(r#"{ "prediction": true, "radius": 150.0 }"#).expect("parse");
        assert_eq!(p.radius, 150.0);
    }
}
