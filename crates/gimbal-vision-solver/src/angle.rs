use gimbal_vision_core::{flight_time, leveled_target, solve_flight_time_squared};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::SolverParams;
use crate::pose::Pose;

/// Gimbal corrections in degrees plus the projectile flight time in
/// seconds. All zero means no solution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleCorrection {
    pub yaw: f64,
    /// Positive pitches the barrel down.
    pub pitch: f64,
    pub flight_time: f64,
}

impl AngleCorrection {
    pub const ZERO: AngleCorrection = AngleCorrection {
        yaw: 0.0,
        pitch: 0.0,
        flight_time: 0.0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Ballistic aiming under gravity only.
#[derive(Clone, Copy, Debug)]
pub struct AngleSolver {
    gravity: f64,
    margin: f64,
}

impl Default for AngleSolver {
    fn default() -> Self {
        Self::from_params(&SolverParams::default())
    }
}

impl AngleSolver {
    pub fn new(gravity: f64, margin: f64) -> Self {
        Self { gravity, margin }
    }

    pub fn from_params(params: &SolverParams) -> Self {
        Self::new(params.gravity, params.flight_margin)
    }

    /// Corrections to hit `target` with muzzle `speed` (m/s) from the
    /// current absolute pitch `ptz_pitch` (degrees, up positive).
    ///
    /// Out-of-envelope targets and the zero pose give the zero sentinel.
    #[cfg_attr(feature = "tracing", instrument(level = "trace"))]
    pub fn solve(&self, target: &Pose, speed: f64, ptz_pitch: f64) -> AngleCorrection {
        if target.is_zero() || speed.is_nan() || speed <= 0.0 {
            return AngleCorrection::ZERO;
        }

        let leveled = leveled_target(target.as_vector(), ptz_pitch);
        let range = leveled.range();
        let g = self.gravity;
        let t2 = solve_flight_time_squared(range, leveled.drop, speed, g);
        let t = t2.sqrt();

        // launch angle below the horizon (y is down)
        let dip = ((leveled.drop - 0.5 * g * t2) / (speed * t)).asin().to_degrees();
        let pitch = -(dip + ptz_pitch);
        let yaw = leveled.x.atan2(leveled.z).to_degrees();

        if !pitch.is_finite() || !yaw.is_finite() {
            log::trace!("target {target:?} out of reach at {speed} m/s");
            return AngleCorrection::ZERO;
        }

        AngleCorrection {
            yaw,
            pitch,
            flight_time: flight_time(target.as_vector(), speed, ptz_pitch, g, self.margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn straight_ahead_target_needs_no_yaw() {
        let c = AngleSolver::default().solve(&Pose::new(0.0, 0.0, 5.0), 15.0, 0.0);
        assert_abs_diff_eq!(c.yaw, 0.0);
        assert!(c.pitch.is_finite());
        // aims up to compensate drop
        assert!(c.pitch > 0.0);
        assert!(c.flight_time > 0.0);
    }

    #[test]
    fn out_of_envelope_is_zero_sentinel() {
        let solver = AngleSolver::default();
        let c = solver.solve(&Pose::new(0.0, -2.0, 80.0), 10.0, 0.0);
        assert!(c.is_zero());
        assert!(!c.yaw.is_nan() && !c.pitch.is_nan());
    }

    #[test]
    fn zero_pose_and_zero_speed_are_rejected() {
        let solver = AngleSolver::default();
        assert!(solver.solve(&Pose::ZERO, 15.0, 0.0).is_zero());
        assert!(solver.solve(&Pose::new(0.0, 0.0, 5.0), 0.0, 0.0).is_zero());
    }

    #[test]
    fn side_target_yaws_towards_it() {
        let c = AngleSolver::default().solve(&Pose::new(1.0, 0.0, 1.0), 20.0, 0.0);
        assert_abs_diff_eq!(c.yaw, 45.0, epsilon = 1e-9);
    }
}
