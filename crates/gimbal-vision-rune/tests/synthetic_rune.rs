use approx::assert_abs_diff_eq;
use gimbal_vision_core::{EnemyColor, GimbalAttitude};
use gimbal_vision_rune::{RuneDetector, RuneOutcome, RuneParams, RunePhase};
use image::{Rgb, RgbImage};

const LIT: Rgb<u8> = Rgb([230, 40, 30]);

fn fill(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, LIT);
        }
    }
}

/// 40x80 hollow panel frame (4 px strokes) centered at (319.5, 139.5).
fn draw_panel(img: &mut RgbImage) {
    fill(img, 300, 100, 40, 4);
    fill(img, 300, 176, 40, 4);
    fill(img, 300, 100, 4, 80);
    fill(img, 336, 100, 4, 80);
}

/// 16x100 pointer below the panel, centered at (319.5, 233.5).
fn draw_fan(img: &mut RgbImage) {
    fill(img, 312, 184, 16, 100);
}

/// 8x8 hub marker centered at (319.5, 309.5), 170 px below the panel.
fn draw_marker(img: &mut RgbImage) {
    fill(img, 316, 306, 8, 8);
}

fn frame(panel: bool, fan: bool, marker: bool) -> RgbImage {
    let mut img = RgbImage::new(640, 480);
    if panel {
        draw_panel(&mut img);
    }
    if fan {
        draw_fan(&mut img);
    }
    if marker {
        draw_marker(&mut img);
    }
    img
}

fn found(outcome: RuneOutcome) -> gimbal_vision_rune::RuneObservation {
    match outcome {
        RuneOutcome::Found(obs) => obs,
        RuneOutcome::Lost => panic!("expected a detection"),
    }
}

#[test]
fn full_rune_calibrates_once() {
    let mut detector = RuneDetector::new(RuneParams::default());
    let first = found(detector.detect(
        &frame(true, true, true),
        EnemyColor::Red,
        GimbalAttitude::new(1.5, -2.0),
    ));

    assert_abs_diff_eq!(first.panel.center.x, 319.5, epsilon = 0.5);
    assert_abs_diff_eq!(first.panel.center.y, 139.5, epsilon = 0.5);
    assert!(first.panel.height > first.panel.width);
    assert!(first.fan.is_some());
    assert!(first.marker.is_some());
    let hub = first.center.expect("hub");
    assert_abs_diff_eq!(hub.x, 319.5, epsilon = 0.5);
    assert_abs_diff_eq!(hub.y, 309.5, epsilon = 0.5);
    assert!(first.calibrated_now);

    let second = found(detector.detect(
        &frame(true, true, true),
        EnemyColor::Red,
        GimbalAttitude::new(7.0, 7.0),
    ));
    assert!(!second.calibrated_now);
    let calibration = detector.state().calibration().expect("calibrated");
    assert_eq!(calibration.origin, GimbalAttitude::new(1.5, -2.0));
    assert_eq!(detector.state().phase(), RunePhase::Calibrated);
}

#[test]
fn missing_marker_keeps_geometric_estimate() {
    let mut detector = RuneDetector::new(RuneParams::default());
    let obs = found(detector.detect(
        &frame(true, true, false),
        EnemyColor::Red,
        GimbalAttitude::default(),
    ));
    assert!(obs.marker.is_none());
    let hub = obs.center.expect("estimate");
    assert_abs_diff_eq!(hub.x, 319.5, epsilon = 1.0);
    assert_abs_diff_eq!(hub.y, 139.5 + 170.0, epsilon = 1.0);
    assert!(!detector.state().is_calibrated());
    assert_eq!(detector.state().phase(), RunePhase::FoundPanelAndFan);
}

#[test]
fn total_loss_leaves_state_alone() {
    let mut detector = RuneDetector::new(RuneParams::default());
    found(detector.detect(
        &frame(true, true, true),
        EnemyColor::Red,
        GimbalAttitude::default(),
    ));
    let before = detector.state().panel;

    let outcome = detector.detect(&frame(false, false, false), EnemyColor::Red, GimbalAttitude::default());
    assert_eq!(outcome, RuneOutcome::Lost);
    assert_eq!(detector.state().panel, before);
    assert!(detector.state().is_calibrated());
}

#[test]
fn fan_only_reuses_last_panel() {
    let mut fresh = RuneDetector::new(RuneParams::default());
    assert_eq!(
        fresh.detect(&frame(false, true, false), EnemyColor::Red, GimbalAttitude::default()),
        RuneOutcome::Lost
    );

    let mut tracked = RuneDetector::new(RuneParams::default());
    let full = found(tracked.detect(
        &frame(true, true, false),
        EnemyColor::Red,
        GimbalAttitude::default(),
    ));
    let fan_only = found(tracked.detect(
        &frame(false, true, false),
        EnemyColor::Red,
        GimbalAttitude::default(),
    ));
    assert_eq!(fan_only.panel, full.panel);
    assert!(fan_only.fan.is_some());
}

#[test]
fn hub_estimate_does_not_depend_on_discovery_order() {
    // panel seen alone first, then together with the fan
    let mut staged = RuneDetector::new(RuneParams::default());
    let panel_only = found(staged.detect(
        &frame(true, false, false),
        EnemyColor::Red,
        GimbalAttitude::default(),
    ));
    assert!(panel_only.fan.is_none());
    assert!(panel_only.center.is_none());
    let staged_hub = found(staged.detect(
        &frame(true, true, false),
        EnemyColor::Red,
        GimbalAttitude::default(),
    ))
    .center
    .expect("hub");

    let mut direct = RuneDetector::new(RuneParams::default());
    let direct_hub = found(direct.detect(
        &frame(true, true, false),
        EnemyColor::Red,
        GimbalAttitude::default(),
    ))
    .center
    .expect("hub");

    assert_abs_diff_eq!(staged_hub.x, direct_hub.x, epsilon = 1e-4);
    assert_abs_diff_eq!(staged_hub.y, direct_hub.y, epsilon = 1e-4);
}

#[test]
fn blue_rune_is_invisible_to_red_search() {
    let mut detector = RuneDetector::new(RuneParams::default());
    let outcome = detector.detect(&frame(true, true, true), EnemyColor::Blue, GimbalAttitude::default());
    assert_eq!(outcome, RuneOutcome::Lost);
}
