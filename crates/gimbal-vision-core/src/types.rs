use serde::{Deserialize, Serialize};

/// Color of the opponent's light strips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyColor {
    #[default]
    Red,
    Blue,
}

/// Working mode commanded by the turret controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkMode {
    /// First-generation armor aiming: yaw/pitch deltas go out on the wire.
    #[default]
    Armor1,
    /// Second-generation armor aiming: the 3-D position goes out on the wire.
    Armor2,
    SmallRune,
    BigRune,
    Hero,
    Engineer,
}

impl WorkMode {
    pub fn is_armor(self) -> bool {
        matches!(self, WorkMode::Armor1 | WorkMode::Armor2)
    }

    pub fn is_rune(self) -> bool {
        matches!(self, WorkMode::SmallRune | WorkMode::BigRune)
    }
}

/// Turret attitude reported by the controller, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GimbalAttitude {
    pub pitch: f64,
    pub yaw: f64,
}

impl GimbalAttitude {
    pub fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }
}

/// Physical half extents of a planar target, in millimeters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HalfSize {
    /// Along the target's long axis.
    pub length: f64,
    pub width: f64,
}

impl HalfSize {
    pub const fn new(length: f64, width: f64) -> Self {
        Self { length, width }
    }
}
