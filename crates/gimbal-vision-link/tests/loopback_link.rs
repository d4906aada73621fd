use std::time::Duration;

use approx::assert_abs_diff_eq;

use gimbal_vision_core::{EnemyColor, GimbalAttitude, WorkMode};
use gimbal_vision_link::{
    CommandPacket, Link, LinkDevice, LinkState, LoopbackLink, RetryError, RetryPolicy,
    Supervisor, TelemetryPacket,
};

fn telemetry(yaw: f64) -> TelemetryPacket {
    TelemetryPacket {
        mode: WorkMode::SmallRune,
        enemy_color: EnemyColor::Blue,
        attitude: GimbalAttitude::new(-1.25, yaw),
        bullet_speed: 29.5,
    }
}

#[test]
fn commands_reach_the_controller_side() {
    let (device, peer) = LoopbackLink::pair();
    let mut link = Link::new(device);
    link.open().expect("open");

    let command = CommandPacket {
        mode: WorkMode::BigRune,
        yaw: -3.5,
        pitch: 0.75,
        ..CommandPacket::default()
    };
    link.send(&command).expect("send");

    let sent = peer.sent();
    assert_eq!(sent.len(), 1);
    let back = CommandPacket::decode(&sent[0], WorkMode::BigRune).expect("checksum");
    assert_eq!(back.yaw, -3.5);
    assert_eq!(back.pitch, 0.75);
}

#[test]
fn receive_returns_the_newest_valid_frame() {
    let (device, peer) = LoopbackLink::pair();
    let mut link = Link::new(device);
    link.open().expect("open");
    assert_eq!(link.receive().expect("read"), None);

    let mut corrupt = telemetry(1.0).encode().expect("head");
    corrupt[4] = corrupt[4].wrapping_add(3);
    peer.feed(&[0x55, 0x00]);
    peer.feed(&telemetry(10.0).encode().expect("head"));
    peer.feed(&corrupt);
    peer.feed(&telemetry(20.0).encode().expect("head"));

    let packet = link.receive().expect("read").expect("packet");
    assert_eq!(packet.mode, WorkMode::SmallRune);
    assert_eq!(packet.enemy_color, EnemyColor::Blue);
    assert_abs_diff_eq!(packet.attitude.yaw, 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(packet.attitude.pitch, -1.25, epsilon = 1e-9);
    assert_abs_diff_eq!(packet.bullet_speed, 29.5, epsilon = 1e-9);
    assert!(link.rejected_frames() >= 1);
}

#[test]
fn write_fault_is_recovered_by_reopening() {
    let (device, peer) = LoopbackLink::pair();
    let mut link = Link::new(device);
    let mut supervisor = Supervisor::new("loopback", RetryPolicy::new(3, Duration::ZERO));

    peer.fail_opens(1);
    supervisor.connect(|| link.open()).expect("second attempt opens");
    assert_eq!(supervisor.state(), LinkState::Open);

    peer.fail_writes(1);
    let command = CommandPacket::cleared(WorkMode::Armor1);
    let err = link.send(&command).expect_err("injected failure");
    supervisor.fault(&err);
    link.close();
    assert_eq!(supervisor.state(), LinkState::Closed);

    supervisor.connect(|| link.open()).expect("reopen");
    link.send(&command).expect("send after reopen");
    assert_eq!(peer.opens(), 2);
    assert_eq!(peer.sent().len(), 1);
}

#[test]
fn unreachable_link_exhausts_the_budget() {
    let (mut device, peer) = LoopbackLink::pair();
    let mut supervisor = Supervisor::new("loopback", RetryPolicy::new(4, Duration::ZERO));
    peer.fail_opens(10);
    let out = supervisor.connect(|| device.open());
    assert_eq!(
        out,
        Err(RetryError::Exhausted {
            what: "loopback".into(),
            attempts: 4
        })
    );
    assert_eq!(supervisor.state(), LinkState::Faulted);
    assert!(!device.is_open());
}
