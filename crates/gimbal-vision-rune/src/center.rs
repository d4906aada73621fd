use gimbal_vision_core::RotatedShape;
use nalgebra::Point2;

/// Hub estimate: `radius` pixels from the panel center, in the direction
/// of the fan center.
///
/// `None` when the two centers coincide or `radius` is not finite.
pub fn estimate_center(
    panel: &RotatedShape,
    fan: &RotatedShape,
    radius: f32,
) -> Option<Point2<f32>> {
    let towards = fan.center - panel.center;
    let len = towards.norm();
    if len <= f32::EPSILON || !radius.is_finite() {
        return None;
    }
    Some(panel.center + towards * (radius / len))
}
