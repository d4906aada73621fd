//! Core types and utilities shared by the gimbal-vision pipeline.
//!
//! Everything here is pure: geometry on rotated rectangles and ellipses,
//! pixel rectangles, perspective warps, the pinhole camera model and the
//! projectile and frame-rotation helpers used by the solvers. Detection and
//! device I/O live in the sibling crates.

mod ballistics;
mod camera_model;
mod ellipse;
mod homography;
mod image;
mod rect;
mod shape;
mod transform;
mod types;

pub use ballistics::{
    flight_time, leveled_target, solve_flight_time_squared, LeveledTarget, GRAVITY,
};
pub use camera_model::{
    CameraIntrinsics, CameraModel, RadialTangentialDistortion, UndistortConfig,
};
pub use ellipse::fit_ellipse;
pub use homography::{homography_from_4pt, warp_perspective_rgb, Homography};
pub use image::{sample_bilinear_rgb, Frame};
pub use rect::PixelRect;
pub use shape::{contour_area, min_area_rect, RotatedShape};
pub use transform::{distance2, distance3, to_absolute, to_relative};
pub use types::{EnemyColor, GimbalAttitude, HalfSize, WorkMode};
