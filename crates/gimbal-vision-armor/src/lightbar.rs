use gimbal_vision_core::{min_area_rect, RotatedShape};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use nalgebra::Point2;

/// Upright rectangles (`height` is the long side) of the outermost blobs in
/// `mask` with an area above `min_area`, ordered left to right.
///
/// Blobs nested in holes of other blobs are ignored. There is no upper area
/// bound; oversized merges fail the pair gates later.
pub fn find_lightbars(mask: &GrayImage, min_area: f32) -> Vec<RotatedShape> {
    let mut bars: Vec<RotatedShape> = find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let pts: Vec<Point2<f32>> = c
                .points
                .iter()
                .map(|p| Point2::new(p.x as f32, p.y as f32))
                .collect();
            min_area_rect(&pts)
        })
        .filter(|r| r.area() > min_area)
        .map(RotatedShape::into_upright)
        .collect();

    bars.sort_by(|a, b| a.center.x.total_cmp(&b.center.x));
    bars
}
