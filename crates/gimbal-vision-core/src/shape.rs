use geo::{Area, BooleanOps, ConvexHull, LineString, MinimumRotatedRect, MultiPoint, Polygon};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::rect::PixelRect;

/// Rotated rectangle in image coordinates (x right, y down).
///
/// `width` runs along the shape's local x axis, `height` along its local y
/// axis; `angle` (degrees) rotates the local axes clockwise on screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedShape {
    pub center: Point2<f32>,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

impl Default for RotatedShape {
    fn default() -> Self {
        Self {
            center: Point2::origin(),
            width: 0.0,
            height: 0.0,
            angle: 0.0,
        }
    }
}

impl RotatedShape {
    pub fn new(center: Point2<f32>, width: f32, height: f32, angle: f32) -> Self {
        Self {
            center,
            width,
            height,
            angle,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Long side over short side; infinite for a degenerate shape.
    pub fn elongation(&self) -> f32 {
        let long = self.width.max(self.height);
        let short = self.width.min(self.height);
        if short <= f32::EPSILON {
            f32::INFINITY
        } else {
            long / short
        }
    }

    /// Make `height` the long side, adding 90 degrees when the sides swap.
    pub fn into_upright(self) -> Self {
        if self.width > self.height {
            Self::new(self.center, self.height, self.width, self.angle + 90.0)
        } else {
            self
        }
    }

    /// Make `width` the long side, adding 90 degrees when the sides swap.
    pub fn into_landscape(self) -> Self {
        if self.width < self.height {
            Self::new(self.center, self.height, self.width, self.angle + 90.0)
        } else {
            self
        }
    }

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            center: self.center + Vector2::new(dx, dy),
            ..self
        }
    }

    /// Corners clockwise from the local top-left: TL, TR, BR, BL.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        let (s, c) = self.angle.to_radians().sin_cos();
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(lx, ly)| {
            Point2::new(
                self.center.x + lx * c - ly * s,
                self.center.y + lx * s + ly * c,
            )
        })
    }

    /// Smallest integer rectangle covering all four corners.
    pub fn bounding_rect(&self) -> PixelRect {
        let pts = self.corners();
        let (mut x0, mut y0) = (f32::INFINITY, f32::INFINITY);
        let (mut x1, mut y1) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &pts {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        let x = x0.floor() as i32;
        let y = y0.floor() as i32;
        PixelRect::new(x, y, x1.ceil() as i32 - x + 1, y1.ceil() as i32 - y + 1)
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        let ring: Vec<(f64, f64)> = self
            .corners()
            .iter()
            .map(|p| (p.x as f64, p.y as f64))
            .collect();
        Polygon::new(LineString::from(ring), vec![])
    }

    /// True when the two shapes overlap with non-zero area.
    pub fn intersects(&self, other: &RotatedShape) -> bool {
        self.to_polygon()
            .intersection(&other.to_polygon())
            .unsigned_area()
            > 0.0
    }

    /// Bring the angle into [-45, 45), swapping sides as needed.
    fn canonical(mut self) -> Self {
        while self.angle >= 45.0 {
            self.angle -= 90.0;
            std::mem::swap(&mut self.width, &mut self.height);
        }
        while self.angle < -45.0 {
            self.angle += 90.0;
            std::mem::swap(&mut self.width, &mut self.height);
        }
        self
    }
}

/// Minimum-area rotated rectangle enclosing `points`.
///
/// The angle of the result lies in [-45, 45). Collinear input yields a
/// zero-height rectangle along the point spread; `None` for empty input.
pub fn min_area_rect(points: &[Point2<f32>]) -> Option<RotatedShape> {
    let first = *points.first()?;
    let cloud: MultiPoint<f64> = points
        .iter()
        .map(|p| (p.x as f64, p.y as f64))
        .collect::<Vec<_>>()
        .into();
    let hull = cloud.convex_hull();

    if hull.unsigned_area() <= f64::EPSILON {
        return Some(segment_rect(points, first));
    }

    let rect = hull.minimum_rotated_rect()?;
    let ring: Vec<_> = rect.exterior().coords().copied().collect();
    if ring.len() < 3 {
        return Some(segment_rect(points, first));
    }
    let p0 = Point2::new(ring[0].x, ring[0].y);
    let p1 = Point2::new(ring[1].x, ring[1].y);
    let p2 = Point2::new(ring[2].x, ring[2].y);
    let e1 = p1 - p0;
    let e2 = p2 - p1;
    let center = nalgebra::center(&p0, &p2);

    Some(
        RotatedShape::new(
            Point2::new(center.x as f32, center.y as f32),
            e1.norm() as f32,
            e2.norm() as f32,
            e1.y.atan2(e1.x).to_degrees() as f32,
        )
        .canonical(),
    )
}

/// Enclosed area of a closed polygon (shoelace), independent of winding.
pub fn contour_area(points: &[Point2<f32>]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let ring: Vec<(f64, f64)> = points.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    Polygon::new(LineString::from(ring), vec![]).unsigned_area() as f32
}

fn segment_rect(points: &[Point2<f32>], first: Point2<f32>) -> RotatedShape {
    // farthest pair from the first point spans the segment
    let far = points
        .iter()
        .copied()
        .max_by(|a, b| {
            (*a - first)
                .norm_squared()
                .total_cmp(&(*b - first).norm_squared())
        })
        .unwrap_or(first);
    let other = points
        .iter()
        .copied()
        .max_by(|a, b| (*a - far).norm_squared().total_cmp(&(*b - far).norm_squared()))
        .unwrap_or(first);
    let d = other - far;
    RotatedShape::new(
        nalgebra::center(&far, &other),
        d.norm(),
        0.0,
        d.y.atan2(d.x).to_degrees(),
    )
    .canonical()
}
