use gimbal_vision_core::{contour_area, fit_ellipse, min_area_rect, PixelRect, RotatedShape};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use nalgebra::Point2;

use crate::params::RuneParams;

fn to_points(contour: &Contour<i32>) -> Vec<Point2<f32>> {
    contour
        .points
        .iter()
        .map(|p| Point2::new(p.x as f32, p.y as f32))
        .collect()
}

fn within(v: f32, lo: f32, hi: f32) -> bool {
    v >= lo && v <= hi
}

/// First outermost island of `recovered` (see `recover_panels`) whose
/// area and rectangle elongation fit the panel windows, upright.
pub fn find_panel(recovered: &GrayImage, params: &RuneParams) -> Option<RotatedShape> {
    find_contours::<i32>(recovered)
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .find_map(|c| {
            let pts = to_points(c);
            let area = contour_area(&pts);
            if !within(area, params.min_panel_area, params.max_panel_area) {
                return None;
            }
            let rect = min_area_rect(&pts)?;
            within(rect.elongation(), params.min_panel_ratio, params.max_panel_ratio)
                .then(|| rect.into_upright())
        })
}

/// First contour of `mask` (any nesting level) whose area fits the fan
/// window, whose fitted ellipse has an acceptable elongation and overlaps
/// `panel`. Returned upright.
pub fn find_fan(mask: &GrayImage, panel: &RotatedShape, params: &RuneParams) -> Option<RotatedShape> {
    find_contours::<i32>(mask).iter().find_map(|c| {
        let pts = to_points(c);
        let area = contour_area(&pts);
        if !within(area, params.min_fan_area, params.max_fan_area) {
            return None;
        }
        let ellipse = fit_ellipse(&pts)?;
        if !within(ellipse.elongation(), params.min_fan_ratio, params.max_fan_ratio) {
            return None;
        }
        ellipse.intersects(panel).then(|| ellipse.into_upright())
    })
}

/// Look for the hub marker in a `marker_window`-sized square of `mask`
/// centered on `around`. The shape is in frame coordinates.
pub fn find_marker(
    mask: &GrayImage,
    around: Point2<f32>,
    params: &RuneParams,
) -> Option<RotatedShape> {
    let side = params.marker_window as i32;
    let window = PixelRect::new(
        around.x.round() as i32 - side / 2,
        around.y.round() as i32 - side / 2,
        side,
        side,
    )
    .intersect_image(mask.width(), mask.height())?;

    let region = image::imageops::crop_imm(
        mask,
        window.x as u32,
        window.y as u32,
        window.width as u32,
        window.height as u32,
    )
    .to_image();

    find_contours::<i32>(&region).iter().find_map(|c| {
        let pts = to_points(c);
        let area = contour_area(&pts);
        if !within(area, params.min_marker_area, params.max_marker_area) {
            return None;
        }
        min_area_rect(&pts).map(|r| r.translated(window.x as f32, window.y as f32))
    })
}
