//! Turret-relative and absolute frames.
//!
//! The absolute frame is the turret frame at zero attitude. It does not
//! move with the gimbal; `to_absolute` and `to_relative` convert between
//! it and the current turret frame given the gimbal pitch and yaw (degrees).

use nalgebra::{Point2, Point3, Vector3};

pub fn distance2(a: Point2<f64>, b: Point2<f64>) -> f64 {
    (b - a).norm()
}

pub fn distance3(a: Point3<f64>, b: Point3<f64>) -> f64 {
    (b - a).norm()
}

/// Express a turret-relative point in the absolute frame.
pub fn to_absolute(p: Vector3<f64>, pitch_deg: f64, yaw_deg: f64) -> Vector3<f64> {
    let (sp, cp) = pitch_deg.to_radians().sin_cos();
    let (sy, cy) = yaw_deg.to_radians().sin_cos();
    Vector3::new(
        p.x * cy + p.y * sp * sy - p.z * cp * sy,
        p.y * cp + p.z * sp,
        p.x * sy - p.y * sp * cy + p.z * cp * cy,
    )
}

/// Express an absolute-frame point in the current turret frame.
pub fn to_relative(p: Vector3<f64>, pitch_deg: f64, yaw_deg: f64) -> Vector3<f64> {
    let (sp, cp) = pitch_deg.to_radians().sin_cos();
    let (sy, cy) = yaw_deg.to_radians().sin_cos();
    Vector3::new(
        p.x * cy + p.z * sy,
        p.x * sy * sp + p.y * cp - p.z * cy * sp,
        -p.x * sy * cp + p.y * sp + p.z * cy * cp,
    )
}
