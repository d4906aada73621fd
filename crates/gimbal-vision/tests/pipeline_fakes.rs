use std::time::{Duration, Instant};

use approx::assert_abs_diff_eq;
use gimbal_vision::link::{
    CommandPacket, LoopbackLink, RetryPolicy, ScriptedCamera, TelemetryPacket,
};
use gimbal_vision::{
    ColorSetting, EnemyColor, FrameProcessor, GimbalAttitude, Pipeline, PipelineConfig,
    PipelineError, WorkMode,
};
use image::{Rgb, RgbImage};

const LIT_RED: Rgb<u8> = Rgb([255, 200, 60]);

fn fill(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, color);
        }
    }
}

fn plate_frame() -> RgbImage {
    let mut img = RgbImage::new(640, 480);
    fill(&mut img, 250, 220, 5, 31, LIT_RED);
    fill(&mut img, 349, 220, 5, 31, LIT_RED);
    img
}

fn fast_config(max_attempts: u32) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.workspace.retry = RetryPolicy {
        max_attempts,
        backoff: Duration::ZERO,
    };
    config
}

fn pipeline(config: PipelineConfig, camera: ScriptedCamera) -> Pipeline {
    Pipeline::new(config)
        .expect("valid config")
        .with_camera(Box::new(camera))
}

#[test]
fn plate_frames_produce_aiming_commands() {
    let (link, peer) = LoopbackLink::pair();
    let camera = ScriptedCamera::new((0..4).map(|_| plate_frame()));

    let summary = pipeline(fast_config(3), camera)
        .with_link(Box::new(link))
        .run()
        .expect("run");

    assert_eq!(summary.frames_acquired, 4);
    assert!(summary.frames_processed >= 1);
    assert!(summary.frames_processed <= 4);
    assert!(summary.commands_sent >= 1);

    let sent = peer.sent();
    assert_eq!(sent.len() as u64, summary.commands_sent);
    let last = CommandPacket::decode(sent.last().expect("frame"), WorkMode::Armor1)
        .expect("valid checksum");
    assert_eq!(last.mode, WorkMode::Armor1);
    assert!(last.yaw != 0.0 || last.pitch != 0.0, "{last:?}");

    // same frame through a standalone processor, up to the 0.01 deg wire step
    let mut processor = FrameProcessor::new(&PipelineConfig::default());
    let direct = processor.process(&plate_frame(), &TelemetryPacket::default());
    assert_abs_diff_eq!(last.yaw, direct.yaw, epsilon = 0.006);
    assert_abs_diff_eq!(last.pitch, direct.pitch, epsilon = 0.006);
}

#[test]
fn forced_color_ignores_the_other_team() {
    let (link, peer) = LoopbackLink::pair();
    let camera = ScriptedCamera::new((0..3).map(|_| plate_frame()));
    let mut config = fast_config(3);
    config.workspace.enemy_color = ColorSetting::Blue;

    let summary = pipeline(config, camera)
        .with_link(Box::new(link))
        .run()
        .expect("run");

    assert!(summary.commands_sent >= 1);
    for frame in peer.sent() {
        let command = CommandPacket::decode(&frame, WorkMode::Armor1).expect("valid");
        assert_eq!((command.yaw, command.pitch), (0.0, 0.0));
    }
}

#[test]
fn camera_recovers_within_retry_budget() {
    let camera = ScriptedCamera::new([plate_frame()]).with_failing_opens(2);
    let summary = pipeline(fast_config(3), camera)
        .without_link()
        .run()
        .expect("third open succeeds");
    assert_eq!(summary.frames_acquired, 1);
    assert_eq!(summary.commands_sent, 0);
}

#[test]
fn exhausted_camera_retries_stop_the_pipeline() {
    let camera = ScriptedCamera::new([plate_frame()]).with_failing_opens(5);
    let err = pipeline(fast_config(3), camera)
        .without_link()
        .run()
        .expect_err("budget exhausted");
    assert!(matches!(err, PipelineError::Retry(_)), "{err}");
}

#[test]
fn unreachable_controller_stops_the_pipeline() {
    let (link, peer) = LoopbackLink::pair();
    peer.fail_opens(10);
    let camera = ScriptedCamera::new((0..2).map(|_| plate_frame()));

    let err = pipeline(fast_config(2), camera)
        .with_link(Box::new(link))
        .run()
        .expect_err("link never opens");
    assert!(matches!(err, PipelineError::Retry(_)), "{err}");
    assert_eq!(peer.opens(), 0);
}

#[test]
fn telemetry_reaches_the_link_stats() {
    let (link, peer) = LoopbackLink::pair();
    let report = TelemetryPacket {
        mode: WorkMode::Armor1,
        enemy_color: EnemyColor::Red,
        attitude: GimbalAttitude::new(1.5, -3.0),
        bullet_speed: 21.0,
    };
    peer.feed(&report.encode().expect("armor head"));
    let camera = ScriptedCamera::new((0..3).map(|_| plate_frame()));

    let summary = pipeline(fast_config(3), camera)
        .with_link(Box::new(link))
        .run()
        .expect("run");
    // the frame may arrive after processing drained; it is never counted twice
    assert!(summary.telemetry_received <= 1);
    assert_eq!(peer.opens(), 1);
}

#[test]
fn stop_before_run_acquires_nothing() {
    let camera = ScriptedCamera::new((0..3).map(|_| plate_frame()));
    let pipeline = pipeline(fast_config(3), camera).without_link();
    pipeline.stop_handle().stop();

    let summary = pipeline.run().expect("clean stop");
    assert_eq!(summary.frames_acquired, 0);
    assert_eq!(summary.frames_processed, 0);
}

#[test]
fn camera_mode_without_driver_is_reported() {
    let mut config = fast_config(3);
    config.workspace.use_camera = true;
    let err = Pipeline::new(config)
        .expect("valid config")
        .without_link()
        .run()
        .expect_err("no driver");
    assert!(matches!(err, PipelineError::NoCamera));
}

#[test]
fn transient_grab_failures_reopen_the_camera() {
    let camera = ScriptedCamera::new((0..3).map(|_| plate_frame())).with_failing_grabs(2);
    let summary = pipeline(fast_config(3), camera)
        .without_link()
        .run()
        .expect("recovers");
    assert_eq!(summary.frames_acquired, 3);
}

#[test]
fn camera_that_never_delivers_runs_out_of_budget() {
    let camera = ScriptedCamera::new([plate_frame()]).with_failing_grabs(u32::MAX);
    let started = Instant::now();
    let err = pipeline(fast_config(3), camera)
        .without_link()
        .run()
        .expect_err("grab keeps failing");
    assert!(matches!(err, PipelineError::Retry(_)), "{err}");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn corrupt_image_in_sequence_is_skipped_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    plate_frame().save(dir.path().join("0001.png")).expect("write");
    std::fs::write(dir.path().join("0002.png"), b"garbage, not an image").expect("write");
    plate_frame().save(dir.path().join("0003.png")).expect("write");

    let mut config = fast_config(3);
    config.workspace.video_path = dir.path().to_path_buf();
    let summary = Pipeline::new(config)
        .expect("valid config")
        .without_link()
        .run()
        .expect("sequence ends cleanly");

    assert_eq!(summary.frames_acquired, 2);
    assert_eq!(summary.frames_skipped, 1);
    assert!(summary.frames_processed >= 1 && summary.frames_processed <= 2);
}
