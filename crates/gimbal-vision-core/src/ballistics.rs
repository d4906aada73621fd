//! Parabolic projectile model shared by the angle solver.
//!
//! Positions are turret-relative meters with y pointing down; the gimbal
//! pitch is positive upwards.

use nalgebra::Vector3;

/// Standard gravity at the competition site, m/s^2.
pub const GRAVITY: f64 = 9.7988;

/// Target position in the gravity-aligned frame of the current shot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeveledTarget {
    pub x: f64,
    /// Vertical offset, positive below the muzzle.
    pub drop: f64,
    /// Forward distance along the leveled boresight.
    pub z: f64,
}

impl LeveledTarget {
    /// Horizontal distance to the target.
    pub fn range(&self) -> f64 {
        self.x.hypot(self.z)
    }
}

/// Undo the gimbal pitch so that gravity acts along +y only.
pub fn leveled_target(position: Vector3<f64>, pitch_deg: f64) -> LeveledTarget {
    let (s, c) = pitch_deg.to_radians().sin_cos();
    LeveledTarget {
        x: position.x,
        drop: position.y * c - position.z * s,
        z: position.y * s + position.z * c,
    }
}

/// Squared flight time of the flat trajectory hitting (range, drop).
///
/// Non-finite when the target is outside the envelope of `speed`.
pub fn solve_flight_time_squared(range: f64, drop: f64, speed: f64, gravity: f64) -> f64 {
    let g = gravity;
    let b = g * drop + speed * speed;
    let disc = b * b - (range * range + drop * drop) * g * g;
    2.0 * (b - disc.sqrt()) / (g * g)
}

/// Flight time to `position` plus `margin`, or zero when unreachable.
pub fn flight_time(
    position: Vector3<f64>,
    speed: f64,
    pitch_deg: f64,
    gravity: f64,
    margin: f64,
) -> f64 {
    let t = leveled_target(position, pitch_deg);
    let t2 = solve_flight_time_squared(t.range(), t.drop, speed, gravity);
    let time = t2.sqrt();
    if time.is_finite() {
        time + margin
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn level_shot_matches_kinematics() {
        // launch at 5 degrees, 25 m/s, observe where it is after 0.4 s
        let (v, theta, t) = (25.0_f64, 5.0_f64.to_radians(), 0.4);
        let range = v * theta.cos() * t;
        let rise = v * theta.sin() * t - 0.5 * GRAVITY * t * t;
        let t2 = solve_flight_time_squared(range, -rise, v, GRAVITY);
        assert_abs_diff_eq!(t2.sqrt(), t, epsilon = 1e-9);
    }

    #[test]
    fn unreachable_target_has_zero_flight_time() {
        let far = Vector3::new(0.0, 0.0, 500.0);
        assert_eq!(flight_time(far, 10.0, 0.0, GRAVITY, 0.05), 0.0);
    }

    #[test]
    fn margin_is_added_to_reachable_targets() {
        let p = Vector3::new(0.0, 0.0, 5.0);
        let bare = flight_time(p, 15.0, 0.0, GRAVITY, 0.0);
        assert!(bare > 5.0 / 15.0);
        assert_abs_diff_eq!(
            flight_time(p, 15.0, 0.0, GRAVITY, 0.05),
            bare + 0.05,
            epsilon = 1e-12
        );
    }

    #[test]
    fn pitch_rotates_boresight_into_height() {
        let p = leveled_target(Vector3::new(0.0, 0.0, 10.0), 30.0);
        assert_abs_diff_eq!(p.drop, -5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.z, 10.0 * 30.0_f64.to_radians().cos(), epsilon = 1e-12);
    }
}
