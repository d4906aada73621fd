use gimbal_vision_core::{homography_from_4pt, CameraModel, HalfSize, RotatedShape};
use nalgebra::{Point2, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::SolverParams;

/// Target position relative to the turret, meters. All zero means no target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Pose {
    pub const ZERO: Pose = Pose {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Reorder four corners as left-up, right-up, right-down, left-down: the
/// two smallest x are the left pair, and each pair splits by y.
pub fn order_corners(mut corners: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    corners.sort_by(|a, b| a.x.total_cmp(&b.x));
    let (lu, ld) = if corners[0].y < corners[1].y {
        (corners[0], corners[1])
    } else {
        (corners[1], corners[0])
    };
    let (ru, rd) = if corners[2].y < corners[3].y {
        (corners[2], corners[3])
    } else {
        (corners[3], corners[2])
    };
    [lu, ru, rd, ld]
}

/// Planar four-point pose solver.
///
/// The corners are undistorted to normalized camera coordinates and the
/// plane-to-image homography is decomposed: with `H ~ [r1 r2 t]`, the scale
/// is fixed by the unit length of the rotation columns.
pub struct PoseSolver {
    params: SolverParams,
}

impl PoseSolver {
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Pose of an armor plate; the physical size follows its elongation.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn solve_armor(&self, plate: &RotatedShape) -> Pose {
        let size = if plate.elongation() > self.params.big_armor_ratio {
            self.params.big_armor
        } else {
            self.params.small_armor
        };
        self.solve_shape(plate, size, self.params.armor_offset)
    }

    /// Pose of any rectangle whose long side is `size.length`, in either
    /// orientation on screen.
    pub fn solve_shape(&self, shape: &RotatedShape, size: HalfSize, offset: [f64; 3]) -> Pose {
        let corners = order_corners(shape.corners());
        let across = (corners[1] - corners[0]).norm();
        let down = (corners[3] - corners[0]).norm();
        let size = if across < down {
            HalfSize::new(size.width, size.length)
        } else {
            size
        };
        self.solve_corners(&corners, size, offset)
    }

    /// Pose from ordered corners (left-up, right-up, right-down, left-down).
    ///
    /// The target frame is centered on the rectangle with x to the right and
    /// y down; `offset` (millimeters) is added before conversion to meters.
    pub fn solve_corners(
        &self,
        corners: &[Point2<f32>; 4],
        size: HalfSize,
        offset: [f64; 3],
    ) -> Pose {
        match plane_translation(&self.params.camera, corners, size) {
            Some(t) => {
                let p = (t + Vector3::from(offset)) / 1000.0;
                Pose::new(p.x, p.y, p.z)
            }
            None => {
                log::debug!("pose solve degenerate for corners {corners:?}");
                Pose::ZERO
            }
        }
    }
}

fn plane_translation(
    camera: &CameraModel,
    corners: &[Point2<f32>; 4],
    size: HalfSize,
) -> Option<Vector3<f64>> {
    let (w, h) = (size.length as f32, size.width as f32);
    let object = [
        Point2::new(-w, -h),
        Point2::new(w, -h),
        Point2::new(w, h),
        Point2::new(-w, h),
    ];

    let mut normalized = [Point2::origin(); 4];
    for (dst, px) in normalized.iter_mut().zip(corners) {
        let n = camera.undistort_to_normalized(Point2::new(px.x as f64, px.y as f64))?;
        *dst = Point2::new(n.x as f32, n.y as f32);
    }

    let hm = homography_from_4pt(&object, &normalized)?.h;
    let h1 = hm.column(0).into_owned();
    let h2 = hm.column(1).into_owned();
    let h3 = hm.column(2).into_owned();

    let norm = h1.norm() + h2.norm();
    if norm <= f64::EPSILON {
        return None;
    }
    let mut t = h3 * (2.0 / norm);
    if t.z < 0.0 {
        t = -t;
    }
    (t.iter().all(|v| v.is_finite()) && t.z > 0.0).then_some(t)
}
