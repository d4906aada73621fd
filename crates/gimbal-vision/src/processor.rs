use std::time::Instant;

use gimbal_vision_armor::{ArmorDetector, NumberClassifier};
use gimbal_vision_core::{GimbalAttitude, WorkMode};
use gimbal_vision_link::{CommandPacket, TelemetryPacket};
use gimbal_vision_rune::{RuneDetector, RuneOutcome};
use gimbal_vision_solver::{AngleSolver, Pose, PoseSolver};
use image::RgbImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::config::{PipelineConfig, WorkspaceConfig};

/// One processing cycle: detection, pose, ballistics, command.
///
/// Owns every piece of per-target state (armor ROI, rune calibration), so
/// it lives on the processing thread only.
pub struct FrameProcessor {
    armor: ArmorDetector,
    rune: RuneDetector,
    pose: PoseSolver,
    angle: AngleSolver,
    workspace: WorkspaceConfig,
    marker_pose: Option<Pose>,
}

impl FrameProcessor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            armor: ArmorDetector::new(config.armor.clone()),
            rune: RuneDetector::new(config.rune.clone()),
            pose: PoseSolver::new(config.solver.clone()),
            angle: AngleSolver::from_params(&config.solver),
            workspace: config.workspace.clone(),
            marker_pose: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn NumberClassifier>) -> Self {
        self.armor = self.armor.with_classifier(classifier);
        self
    }

    pub fn armor(&self) -> &ArmorDetector {
        &self.armor
    }

    pub fn rune(&self) -> &RuneDetector {
        &self.rune
    }

    /// Hub marker position captured when the rune was calibrated.
    pub fn marker_pose(&self) -> Option<Pose> {
        self.marker_pose
    }

    /// Apply the configured mode and color overrides to `telemetry`.
    pub fn resolve(&self, mut telemetry: TelemetryPacket) -> TelemetryPacket {
        if let Some(mode) = self.workspace.mode.forced() {
            telemetry.mode = mode;
        }
        if let Some(color) = self.workspace.enemy_color.forced() {
            telemetry.enemy_color = color;
        }
        telemetry
    }

    fn bullet_speed(&self, telemetry: &TelemetryPacket) -> f64 {
        if self.workspace.use_measured_speed && telemetry.bullet_speed > 0.0 {
            return telemetry.bullet_speed;
        }
        if telemetry.mode.is_rune() {
            self.workspace.rune_bullet_speed
        } else {
            self.workspace.armor_bullet_speed
        }
    }

    /// Build the command for `image` given the already-resolved telemetry.
    /// `time_delay` carries the processing time in milliseconds.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, image), fields(mode = ?telemetry.mode))
    )]
    pub fn process(&mut self, image: &RgbImage, telemetry: &TelemetryPacket) -> CommandPacket {
        let started = Instant::now();
        let mode = telemetry.mode;
        let mut command = if mode.is_armor() {
            self.aim_armor(image, telemetry)
        } else if mode.is_rune() {
            self.aim_rune(image, telemetry)
        } else {
            CommandPacket::cleared(mode)
        };
        command.time_delay = started.elapsed().as_secs_f64() * 1000.0;
        command
    }

    fn aim_armor(&mut self, image: &RgbImage, telemetry: &TelemetryPacket) -> CommandPacket {
        let mode = telemetry.mode;
        let Some(target) = self.armor.detect(image, telemetry.enemy_color) else {
            return CommandPacket::cleared(mode);
        };
        let pose = self.pose.solve_armor(&target.shape);
        self.aim_at(mode, pose, telemetry)
    }

    fn aim_rune(&mut self, image: &RgbImage, telemetry: &TelemetryPacket) -> CommandPacket {
        let mode = telemetry.mode;
        let attitude = telemetry.attitude;
        match self.rune.detect(image, telemetry.enemy_color, attitude) {
            RuneOutcome::Found(obs) => {
                let params = self.rune.params();
                let (panel_size, marker_size, offset) =
                    (params.panel_size, params.marker_size, params.pose_offset);
                if obs.calibrated_now {
                    if let Some(marker) = obs.marker {
                        let pose = self.pose.solve_shape(&marker, marker_size, offset);
                        log::info!("rune hub at ({:.3}, {:.3}, {:.3}) m", pose.x, pose.y, pose.z);
                        self.marker_pose = Some(pose);
                    }
                }
                let pose = self.pose.solve_shape(&obs.panel, panel_size, offset);
                self.aim_at(mode, pose, telemetry)
            }
            RuneOutcome::Lost => match self.rune.state().calibration() {
                Some(calibration) => return_to(mode, calibration.origin, attitude),
                None => CommandPacket::cleared(mode),
            },
        }
    }

    fn aim_at(&self, mode: WorkMode, pose: Pose, telemetry: &TelemetryPacket) -> CommandPacket {
        if pose.is_zero() {
            return CommandPacket::cleared(mode);
        }
        let speed = self.bullet_speed(telemetry);
        let correction = self.angle.solve(&pose, speed, telemetry.attitude.pitch);
        CommandPacket {
            mode,
            yaw: correction.yaw,
            pitch: correction.pitch,
            x: pose.x,
            y: pose.y,
            z: pose.z,
            flight_time: correction.flight_time,
            time_delay: 0.0,
        }
    }
}

/// Deltas that bring the gimbal back to the calibration attitude.
fn return_to(mode: WorkMode, origin: GimbalAttitude, current: GimbalAttitude) -> CommandPacket {
    CommandPacket {
        yaw: origin.yaw - current.yaw,
        pitch: origin.pitch - current.pitch,
        ..CommandPacket::cleared(mode)
    }
}
