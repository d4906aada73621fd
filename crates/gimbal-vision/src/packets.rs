//! Command and telemetry slots shared between processing and the link.
//!
//! Each field is its own atomic. A reader may see fields from two
//! consecutive writes; consumers treat the packets as best-effort.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use gimbal_vision_core::{EnemyColor, GimbalAttitude, WorkMode};
use gimbal_vision_link::{CommandPacket, TelemetryPacket};

#[derive(Debug, Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }
}

fn mode_code(mode: WorkMode) -> u8 {
    match mode {
        WorkMode::Armor1 => 0,
        WorkMode::Armor2 => 1,
        WorkMode::SmallRune => 2,
        WorkMode::BigRune => 3,
        WorkMode::Hero => 4,
        WorkMode::Engineer => 5,
    }
}

fn mode_from_code(code: u8) -> WorkMode {
    match code {
        1 => WorkMode::Armor2,
        2 => WorkMode::SmallRune,
        3 => WorkMode::BigRune,
        4 => WorkMode::Hero,
        5 => WorkMode::Engineer,
        _ => WorkMode::Armor1,
    }
}

fn color_code(color: EnemyColor) -> u8 {
    match color {
        EnemyColor::Red => 0,
        EnemyColor::Blue => 1,
    }
}

fn color_from_code(code: u8) -> EnemyColor {
    if code == 1 {
        EnemyColor::Blue
    } else {
        EnemyColor::Red
    }
}

/// Latest command; written by processing, read by the link.
#[derive(Debug, Default)]
pub struct SharedCommand {
    mode: AtomicU8,
    yaw: AtomicF64,
    pitch: AtomicF64,
    x: AtomicF64,
    y: AtomicF64,
    z: AtomicF64,
    flight_time: AtomicF64,
    time_delay: AtomicF64,
    generation: AtomicU64,
}

impl SharedCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, packet: &CommandPacket) {
        self.mode.store(mode_code(packet.mode), Ordering::Relaxed);
        self.yaw.store(packet.yaw);
        self.pitch.store(packet.pitch);
        self.x.store(packet.x);
        self.y.store(packet.y);
        self.z.store(packet.z);
        self.flight_time.store(packet.flight_time);
        self.time_delay.store(packet.time_delay);
        self.generation.fetch_add(1, Ordering::Release);
    }

    pub fn load(&self) -> CommandPacket {
        CommandPacket {
            mode: mode_from_code(self.mode.load(Ordering::Relaxed)),
            yaw: self.yaw.load(),
            pitch: self.pitch.load(),
            x: self.x.load(),
            y: self.y.load(),
            z: self.z.load(),
            flight_time: self.flight_time.load(),
            time_delay: self.time_delay.load(),
        }
    }

    /// Number of commands published so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Latest telemetry; written by the link, read by processing.
#[derive(Debug, Default)]
pub struct SharedTelemetry {
    mode: AtomicU8,
    color: AtomicU8,
    pitch: AtomicF64,
    yaw: AtomicF64,
    bullet_speed: AtomicF64,
}

impl SharedTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Second-generation frames update only mode and color.
    pub fn store(&self, packet: &TelemetryPacket) {
        self.set_mode(packet.mode);
        self.set_color(packet.enemy_color);
        if packet.carries_attitude() {
            self.pitch.store(packet.attitude.pitch);
            self.yaw.store(packet.attitude.yaw);
            self.bullet_speed.store(packet.bullet_speed);
        }
    }

    pub fn set_mode(&self, mode: WorkMode) {
        self.mode.store(mode_code(mode), Ordering::Relaxed);
    }

    pub fn set_color(&self, color: EnemyColor) {
        self.color.store(color_code(color), Ordering::Relaxed);
    }

    pub fn load(&self) -> TelemetryPacket {
        TelemetryPacket {
            mode: mode_from_code(self.mode.load(Ordering::Relaxed)),
            enemy_color: color_from_code(self.color.load(Ordering::Relaxed)),
            attitude: GimbalAttitude::new(self.pitch.load(), self.yaw.load()),
            bullet_speed: self.bullet_speed.load(),
        }
    }
}
