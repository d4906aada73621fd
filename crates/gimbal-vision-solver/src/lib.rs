//! From image corners to turret commands.
//!
//! [`PoseSolver`] recovers the 3-D position of a planar rectangle of known
//! size from its four image corners. [`AngleSolver`] turns a position into
//! yaw and pitch corrections under a drag-free parabolic trajectory.
//!
//! Both report failure through all-zero sentinels rather than errors: a
//! degenerate solve is treated like "no target" downstream.

mod angle;
mod params;
mod pose;

pub use angle::{AngleCorrection, AngleSolver};
pub use params::SolverParams;
pub use pose::{order_corners, Pose, PoseSolver};
