//! Eight-byte frames exchanged with the turret controller.
//!
//! Outbound (vision to turret) frames have no head byte; their layout is
//! chosen by the working mode and byte 7 sums bytes 0..=6. Inbound frames
//! start with a head byte selecting mode and enemy color and byte 7 sums
//! bytes 1..=6. All multi-byte fields are big-endian `i16`.

use gimbal_vision_core::{EnemyColor, GimbalAttitude, WorkMode};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Length of every frame on the wire.
pub const FRAME_LEN: usize = 8;

/// Lowest muzzle speed the inbound speed byte can express, m/s.
const SPEED_BASE: f64 = 5.0;

/// Command published by the processing stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandPacket {
    pub mode: WorkMode,
    /// Yaw correction, degrees.
    pub yaw: f64,
    /// Pitch correction, degrees.
    pub pitch: f64,
    /// Target position, meters.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Projectile flight time, seconds. Not carried on the wire.
    pub flight_time: f64,
    /// Processing latency, milliseconds.
    pub time_delay: f64,
}

impl CommandPacket {
    /// Same mode with every quantity zeroed: "no target".
    pub fn cleared(mode: WorkMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        match self.mode {
            WorkMode::Armor1 | WorkMode::SmallRune | WorkMode::BigRune => {
                put_i16(&mut frame[0..2], self.yaw, 100.0);
                put_i16(&mut frame[2..4], self.pitch, 100.0);
            }
            WorkMode::Armor2 => {
                put_i16(&mut frame[0..2], self.x, 1000.0);
                put_i16(&mut frame[2..4], self.y, 1000.0);
                put_i16(&mut frame[4..6], self.z, 1000.0);
                frame[6] = saturate_u8(self.time_delay);
            }
            WorkMode::Hero | WorkMode::Engineer => {}
        }
        frame[7] = checksum(&frame[0..7]);
        frame
    }

    /// Decode an outbound frame. The layout is not self-describing, so the
    /// sender's `mode` must be supplied.
    pub fn decode(frame: &[u8; FRAME_LEN], mode: WorkMode) -> Result<Self, DecodeError> {
        verify(frame[7], checksum(&frame[0..7]))?;
        let mut packet = Self::cleared(mode);
        match mode {
            WorkMode::Armor1 | WorkMode::SmallRune | WorkMode::BigRune => {
                packet.yaw = get_i16(&frame[0..2], 100.0);
                packet.pitch = get_i16(&frame[2..4], 100.0);
            }
            WorkMode::Armor2 => {
                packet.x = get_i16(&frame[0..2], 1000.0);
                packet.y = get_i16(&frame[2..4], 1000.0);
                packet.z = get_i16(&frame[4..6], 1000.0);
                packet.time_delay = frame[6] as f64;
            }
            WorkMode::Hero | WorkMode::Engineer => {}
        }
        Ok(packet)
    }
}

/// State reported by the turret controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPacket {
    pub mode: WorkMode,
    pub enemy_color: EnemyColor,
    pub attitude: GimbalAttitude,
    /// Measured muzzle speed, m/s; zero when the frame carries none.
    pub bullet_speed: f64,
}

impl TelemetryPacket {
    /// Second-generation frames report only mode and color.
    pub fn carries_attitude(&self) -> bool {
        self.mode != WorkMode::Armor2
    }

    /// `None` for modes that have no head byte.
    pub fn encode(&self) -> Option<[u8; FRAME_LEN]> {
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = head_byte(self.mode, self.enemy_color)?;
        if self.carries_attitude() {
            put_i16(&mut frame[1..3], self.attitude.yaw, 100.0);
            put_i16(&mut frame[3..5], self.attitude.pitch, 100.0);
            frame[5] = saturate_u8((self.bullet_speed - SPEED_BASE) * 10.0);
        }
        frame[7] = checksum(&frame[1..7]);
        Some(frame)
    }

    pub fn decode(frame: &[u8; FRAME_LEN]) -> Result<Self, DecodeError> {
        let (mode, enemy_color) =
            parse_head(frame[0]).ok_or(DecodeError::UnknownHead(frame[0]))?;
        verify(frame[7], checksum(&frame[1..7]))?;

        let mut packet = Self {
            mode,
            enemy_color,
            ..Self::default()
        };
        if packet.carries_attitude() {
            packet.attitude = GimbalAttitude::new(
                get_i16(&frame[3..5], 100.0),
                get_i16(&frame[1..3], 100.0),
            );
            packet.bullet_speed = frame[5] as f64 * 0.1 + SPEED_BASE;
        }
        Ok(packet)
    }
}

/// Head byte announcing `mode` against `color`.
pub fn head_byte(mode: WorkMode, color: EnemyColor) -> Option<u8> {
    let low = match mode {
        WorkMode::Armor1 => 0x01,
        WorkMode::SmallRune => 0x02,
        WorkMode::BigRune => 0x03,
        WorkMode::Armor2 => 0x06,
        WorkMode::Hero | WorkMode::Engineer => return None,
    };
    let high = match color {
        EnemyColor::Red => 0xA0,
        EnemyColor::Blue => 0xB0,
    };
    Some(high | low)
}

/// Inverse of [`head_byte`].
pub fn parse_head(byte: u8) -> Option<(WorkMode, EnemyColor)> {
    let color = match byte & 0xF0 {
        0xA0 => EnemyColor::Red,
        0xB0 => EnemyColor::Blue,
        _ => return None,
    };
    let mode = match byte & 0x0F {
        0x01 => WorkMode::Armor1,
        0x02 => WorkMode::SmallRune,
        0x03 => WorkMode::BigRune,
        0x06 => WorkMode::Armor2,
        _ => return None,
    };
    Some((mode, color))
}

pub fn is_head_byte(byte: u8) -> bool {
    parse_head(byte).is_some()
}

/// Wrapping byte sum.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

fn verify(actual: u8, expected: u8) -> Result<(), DecodeError> {
    if actual == expected {
        Ok(())
    } else {
        Err(DecodeError::Checksum { expected, actual })
    }
}

fn put_i16(dst: &mut [u8], value: f64, scale: f64) {
    // float-to-int `as` saturates and maps NaN to zero
    let raw = (value * scale).round() as i16;
    dst.copy_from_slice(&raw.to_be_bytes());
}

fn get_i16(src: &[u8], scale: f64) -> f64 {
    i16::from_be_bytes([src[0], src[1]]) as f64 / scale
}

fn saturate_u8(value: f64) -> u8 {
    value.round() as u8
}
