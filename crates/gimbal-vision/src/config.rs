//! JSON configuration document for the onboard process.

use std::fs;
use std::path::{Path, PathBuf};

use gimbal_vision_armor::ArmorParams;
use gimbal_vision_core::{EnemyColor, WorkMode};
use gimbal_vision_link::{CameraSettings, RetryPolicy, SerialConfig};
use gimbal_vision_rune::RuneParams;
use gimbal_vision_solver::SolverParams;
use serde::{Deserialize, Serialize};

use crate::frame_buffer::OverflowPolicy;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Working mode forced by configuration, or taken from the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSetting {
    #[default]
    Auto,
    Armor1,
    Armor2,
    SmallRune,
    BigRune,
    Hero,
    Engineer,
}

impl ModeSetting {
    /// `None` for [`ModeSetting::Auto`].
    pub fn forced(self) -> Option<WorkMode> {
        match self {
            ModeSetting::Auto => None,
            ModeSetting::Armor1 => Some(WorkMode::Armor1),
            ModeSetting::Armor2 => Some(WorkMode::Armor2),
            ModeSetting::SmallRune => Some(WorkMode::SmallRune),
            ModeSetting::BigRune => Some(WorkMode::BigRune),
            ModeSetting::Hero => Some(WorkMode::Hero),
            ModeSetting::Engineer => Some(WorkMode::Engineer),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSetting {
    #[default]
    Auto,
    Red,
    Blue,
}

impl ColorSetting {
    pub fn forced(self) -> Option<EnemyColor> {
        match self {
            ColorSetting::Auto => None,
            ColorSetting::Red => Some(EnemyColor::Red),
            ColorSetting::Blue => Some(EnemyColor::Blue),
        }
    }
}

/// Transport to the turret controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Run without a controller; commands are only logged.
    #[default]
    None,
    Serial,
}

/// Process-level switches and device selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub mode: ModeSetting,
    pub enemy_color: ColorSetting,

    /// Grab from a camera driver instead of replaying `video_path`.
    pub use_camera: bool,
    /// Directory of still frames replayed in name order.
    pub video_path: PathBuf,
    /// Record acquired camera frames as numbered PNGs.
    pub save_video: bool,
    pub video_saved_path: PathBuf,

    pub link: LinkKind,
    /// Serial devices probed in order.
    pub serial_ports: Vec<String>,
    pub baud_rate: u32,

    pub buffer_capacity: usize,
    pub overflow: OverflowPolicy,
    pub retry: RetryPolicy,

    /// Muzzle speeds assumed per mode, m/s.
    pub armor_bullet_speed: f64,
    pub rune_bullet_speed: f64,
    /// Prefer the speed reported by the controller when it sends one.
    pub use_measured_speed: bool,

    pub show_image: bool,
    pub trackbar: bool,
    /// Log every cycle's telemetry and command at debug level.
    pub debug_info: bool,
    /// Log per-stage timings.
    pub running_time: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        let serial = SerialConfig::default();
        Self {
            mode: ModeSetting::Auto,
            enemy_color: ColorSetting::Auto,
            use_camera: false,
            video_path: PathBuf::from("frames"),
            save_video: false,
            video_saved_path: PathBuf::from("recorded"),
            link: LinkKind::None,
            serial_ports: serial.ports,
            baud_rate: serial.baud_rate,
            buffer_capacity: 10,
            overflow: OverflowPolicy::default(),
            retry: RetryPolicy::default(),
            armor_bullet_speed: 20.0,
            rune_bullet_speed: 30.0,
            use_measured_speed: false,
            show_image: false,
            trackbar: false,
            debug_info: false,
            running_time: false,
        }
    }
}

impl WorkspaceConfig {
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            ports: self.serial_ports.clone(),
            baud_rate: self.baud_rate,
            ..SerialConfig::default()
        }
    }
}

/// The whole configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Microseconds.
    pub exposure_time: u32,
    pub frame_rate: f64,
    pub gamma: f64,
    pub contrast: i32,

    pub armor: ArmorParams,
    pub rune: RuneParams,
    pub solver: SolverParams,
    pub workspace: WorkspaceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let camera = CameraSettings::default();
        Self {
            frame_width: camera.width,
            frame_height: camera.height,
            exposure_time: camera.exposure,
            frame_rate: camera.frame_rate,
            gamma: camera.gamma,
            contrast: camera.contrast,
            armor: ArmorParams::default(),
            rune: RuneParams::default(),
            solver: SolverParams::default(),
            workspace: WorkspaceConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config from disk. Missing keys take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            width: self.frame_width,
            height: self.frame_height,
            exposure: self.exposure_time,
            frame_rate: self.frame_rate,
            gamma: self.gamma,
            contrast: self.contrast,
        }
    }

    /// Startup checks. Fatal combinations are errors; questionable but
    /// harmless ones are logged and returned as warnings.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        let ws = &self.workspace;
        if ws.save_video && !ws.use_camera {
            return Err(ConfigError::Invalid("save_video requires use_camera".into()));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "frame size {}x{} is empty",
                self.frame_width, self.frame_height
            )));
        }
        if ws.buffer_capacity == 0 {
            return Err(ConfigError::Invalid("buffer_capacity must be positive".into()));
        }
        if ws.link == LinkKind::Serial && ws.serial_ports.is_empty() {
            return Err(ConfigError::Invalid("serial link without serial_ports".into()));
        }

        let mut warnings = Vec::new();
        if ws.trackbar && !ws.show_image {
            warnings.push("trackbar requires show_image; ignoring trackbar".to_owned());
        }
        if ws.show_image {
            warnings.push("no display backend; show_image has no effect".to_owned());
        }
        for w in &warnings {
            log::error!("{w}");
        }
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_fills_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{
                "frame_width": 1280,
                "armor": { "grey_thresh": 120 },
                "workspace": { "mode": "small_rune", "enemy_color": "blue" }
            }"#,
        )
        .expect("parse");
        assert_eq!(cfg.frame_width, 1280);
        assert_eq!(cfg.frame_height, 480);
        assert_eq!(cfg.armor.grey_thresh, 120);
        assert_eq!(cfg.armor.kernel_size, ArmorParams::default().kernel_size);
        assert_eq!(cfg.workspace.mode.forced(), Some(WorkMode::SmallRune));
        assert_eq!(cfg.workspace.enemy_color.forced(), Some(EnemyColor::Blue));
        assert_eq!(cfg.workspace.buffer_capacity, 10);
        assert_eq!(cfg.rune.red_thresh, 50);
    }

    #[test]
    fn save_video_needs_a_camera() {
        let mut cfg = PipelineConfig::default();
        cfg.workspace.save_video = true;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        cfg.workspace.use_camera = true;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn trackbar_without_display_is_only_a_warning() {
        let mut cfg = PipelineConfig::default();
        cfg.workspace.trackbar = true;
        let warnings = cfg.validate().expect("not fatal");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("trackbar"));
    }

    #[test]
    fn written_document_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut cfg = PipelineConfig::default();
        cfg.workspace.link = LinkKind::Serial;
        cfg.solver.big_armor_ratio = 4.2;
        cfg.write_json(&path).expect("write");
        assert_eq!(PipelineConfig::load_json(&path).expect("load"), cfg);
    }
}
