//! Ellipse fitting for closed contours.
//!
//! The contour is treated as a simple polygon and the ellipse is the one
//! sharing its area centroid and second moments. For a filled ellipse the
//! variance along a principal axis is `a^2 / 4`, so the semi-axes come out
//! as twice the square roots of the covariance eigenvalues.

use nalgebra::Point2;

use crate::shape::RotatedShape;

/// Fit an ellipse to a closed contour and return it as a rotated shape
/// (`width`/`height` are full axis lengths).
///
/// Needs at least three vertices enclosing non-zero area.
pub fn fit_ellipse(contour: &[Point2<f32>]) -> Option<RotatedShape> {
    let n = contour.len();
    if n < 3 {
        return None;
    }

    // shift to the first vertex to keep the sums well conditioned
    let ox = contour[0].x as f64;
    let oy = contour[0].y as f64;

    let mut a2 = 0.0_f64; // twice the signed area
    let mut sx = 0.0_f64;
    let mut sy = 0.0_f64;
    let mut sxx = 0.0_f64;
    let mut syy = 0.0_f64;
    let mut sxy = 0.0_f64;

    for i in 0..n {
        let p = contour[i];
        let q = contour[(i + 1) % n];
        let (x0, y0) = (p.x as f64 - ox, p.y as f64 - oy);
        let (x1, y1) = (q.x as f64 - ox, q.y as f64 - oy);
        let cross = x0 * y1 - x1 * y0;
        a2 += cross;
        sx += (x0 + x1) * cross;
        sy += (y0 + y1) * cross;
        sxx += (x0 * x0 + x0 * x1 + x1 * x1) * cross;
        syy += (y0 * y0 + y0 * y1 + y1 * y1) * cross;
        sxy += (x0 * y1 + 2.0 * x0 * y0 + 2.0 * x1 * y1 + x1 * y0) * cross;
    }

    if a2.abs() < 1e-9 {
        return None;
    }
    let area = a2 / 2.0;
    let cx = sx / (6.0 * area);
    let cy = sy / (6.0 * area);
    let mu20 = sxx / (12.0 * area) - cx * cx;
    let mu02 = syy / (12.0 * area) - cy * cy;
    let mu11 = sxy / (24.0 * area) - cx * cy;

    let half_sum = 0.5 * (mu20 + mu02);
    let root = (0.25 * (mu20 - mu02).powi(2) + mu11 * mu11).sqrt();
    let major = half_sum + root;
    let minor = half_sum - root;
    if !(minor > 0.0 && major.is_finite()) {
        return None;
    }

    let angle = 0.5 * (2.0 * mu11).atan2(mu20 - mu02);
    let semi_major = 2.0 * major.sqrt();
    let semi_minor = 2.0 * minor.sqrt();

    Some(RotatedShape::new(
        Point2::new((cx + ox) as f32, (cy + oy) as f32),
        (2.0 * semi_major) as f32,
        (2.0 * semi_minor) as f32,
        angle.to_degrees() as f32,
    ))
}
