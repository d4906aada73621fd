use gimbal_vision_core::{CameraModel, HalfSize, GRAVITY};
use serde::{Deserialize, Serialize};

/// Pose and ballistic solver configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    pub camera: CameraModel,
    pub big_armor: HalfSize,
    pub small_armor: HalfSize,
    /// Plates more elongated than this use `big_armor`.
    pub big_armor_ratio: f32,
    /// Camera-to-turret offset for armor poses, millimeters.
    pub armor_offset: [f64; 3],
    /// Seconds added to every reachable flight time.
    pub flight_margin: f64,
    pub gravity: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            camera: CameraModel::default(),
            big_armor: HalfSize::new(115.04, 55.08),
            small_armor: HalfSize::new(70.30, 27.30),
            big_armor_ratio: 4.8,
            armor_offset: [0.0, -51.4469, 140.7033],
            flight_margin: 0.05,
            gravity: GRAVITY,
        }
    }
}
