//! Pinhole intrinsics with Brown-Conrady distortion.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Pinhole camera intrinsics, in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        // 640x480 sensor with a 6 mm lens
        Self {
            fx: 1280.0,
            fy: 1280.0,
            cx: 320.0,
            cy: 240.0,
        }
    }
}

impl CameraIntrinsics {
    pub fn is_valid(self) -> bool {
        [self.fx, self.fy, self.cx, self.cy]
            .iter()
            .all(|v| v.is_finite())
            && self.fx.abs() > 1e-12
            && self.fy.abs() > 1e-12
    }

    pub fn pixel_to_normalized(self, pixel: Point2<f64>) -> Option<Point2<f64>> {
        if !self.is_valid() {
            return None;
        }
        let p = Point2::new((pixel.x - self.cx) / self.fx, (pixel.y - self.cy) / self.fy);
        (p.x.is_finite() && p.y.is_finite()).then_some(p)
    }

    pub fn normalized_to_pixel(self, normalized: Point2<f64>) -> Point2<f64> {
        Point2::new(
            self.fx * normalized.x + self.cx,
            self.fy * normalized.y + self.cy,
        )
    }
}

/// Distortion coefficients in the `k1 k2 p1 p2 k3` order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RadialTangentialDistortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl RadialTangentialDistortion {
    pub fn distort_normalized(self, p: Point2<f64>) -> Point2<f64> {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r2 * r2 + self.k3 * r2 * r2 * r2;
        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        Point2::new(x * radial + x_tan, y * radial + y_tan)
    }
}

/// Fixed-point undistortion settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UndistortConfig {
    pub max_iters: usize,
    /// Stop once the update norm drops below this.
    pub eps: f64,
}

impl Default for UndistortConfig {
    fn default() -> Self {
        Self {
            max_iters: 15,
            eps: 1e-12,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CameraModel {
    pub intrinsics: CameraIntrinsics,
    #[serde(default)]
    pub distortion: RadialTangentialDistortion,
}

impl CameraModel {
    /// Project a camera-frame point to distorted pixel coordinates.
    pub fn project(self, p: Point3<f64>) -> Option<Point2<f64>> {
        if p.z <= 0.0 {
            return None;
        }
        let n = self
            .distortion
            .distort_normalized(Point2::new(p.x / p.z, p.y / p.z));
        let px = self.intrinsics.normalized_to_pixel(n);
        (px.x.is_finite() && px.y.is_finite()).then_some(px)
    }

    /// Map a distorted pixel to undistorted normalized coordinates.
    pub fn undistort_to_normalized(self, pixel: Point2<f64>) -> Option<Point2<f64>> {
        self.undistort_to_normalized_with(pixel, UndistortConfig::default())
    }

    pub fn undistort_to_normalized_with(
        self,
        pixel: Point2<f64>,
        cfg: UndistortConfig,
    ) -> Option<Point2<f64>> {
        let xd = self.intrinsics.pixel_to_normalized(pixel)?;
        let d = self.distortion;
        let (mut x, mut y) = (xd.x, xd.y);

        for _ in 0..cfg.max_iters.max(1) {
            let r2 = x * x + y * y;
            let radial = 1.0 + d.k1 * r2 + d.k2 * r2 * r2 + d.k3 * r2 * r2 * r2;
            if !radial.is_finite() || radial.abs() < 1e-12 {
                return None;
            }
            let dx_tan = 2.0 * d.p1 * x * y + d.p2 * (r2 + 2.0 * x * x);
            let dy_tan = d.p1 * (r2 + 2.0 * y * y) + 2.0 * d.p2 * x * y;
            let x_next = (xd.x - dx_tan) / radial;
            let y_next = (xd.y - dy_tan) / radial;
            if !x_next.is_finite() || !y_next.is_finite() {
                return None;
            }
            let step = (x_next - x).hypot(y_next - y);
            x = x_next;
            y = y_next;
            if step <= cfg.eps.max(0.0) {
                break;
            }
        }

        Some(Point2::new(x, y))
    }
}
