use gimbal_vision_core::{EnemyColor, GimbalAttitude, RotatedShape};
use image::RgbImage;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::center::estimate_center;
use crate::params::RuneParams;
use crate::preprocess::{recover_panels, segment};
use crate::search::{find_fan, find_marker, find_panel};
use crate::state::EnergyTargetState;

/// Per-frame rune result.
#[derive(Clone, Debug, PartialEq)]
pub enum RuneOutcome {
    /// Neither panel nor fan was seen; tracking state is unchanged.
    Lost,
    Found(RuneObservation),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuneObservation {
    /// Panel to aim at. May be carried over from an earlier frame when only
    /// the fan was visible.
    pub panel: RotatedShape,
    pub fan: Option<RotatedShape>,
    /// Hub position for this frame, when the fan was visible.
    pub center: Option<Point2<f32>>,
    pub marker: Option<RotatedShape>,
    /// The calibration origin was captured on this frame.
    pub calibrated_now: bool,
}

pub struct RuneDetector {
    params: RuneParams,
    state: EnergyTargetState,
}

impl RuneDetector {
    pub fn new(params: RuneParams) -> Self {
        Self {
            params,
            state: EnergyTargetState::default(),
        }
    }

    pub fn params(&self) -> &RuneParams {
        &self.params
    }

    pub fn state(&self) -> &EnergyTargetState {
        &self.state
    }

    /// Drop all tracking state, including the calibration.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Process one frame. `attitude` is the current turret attitude; it is
    /// recorded if this frame completes calibration.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(w = frame.width(), h = frame.height()))
    )]
    pub fn detect(
        &mut self,
        frame: &RgbImage,
        color: EnemyColor,
        attitude: GimbalAttitude,
    ) -> RuneOutcome {
        let mask = segment(frame, color, &self.params);
        let seen_panel = find_panel(&recover_panels(&mask), &self.params);

        let Some(panel) = seen_panel.or(self.state.panel) else {
            log::debug!("rune: nothing found");
            return RuneOutcome::Lost;
        };
        let fan = find_fan(&mask, &panel, &self.params);
        if seen_panel.is_none() && fan.is_none() {
            log::debug!("rune: panel and fan lost");
            return RuneOutcome::Lost;
        }

        self.state.panel = Some(panel);
        if fan.is_some() {
            self.state.fan = fan;
        }

        let mut observation = RuneObservation {
            panel,
            fan,
            center: None,
            marker: None,
            calibrated_now: false,
        };

        let Some(estimate) = fan.and_then(|f| estimate_center(&panel, &f, self.params.radius))
        else {
            log::trace!("rune: panel only at {:?}", panel.center);
            return RuneOutcome::Found(observation);
        };

        match find_marker(&mask, estimate, &self.params) {
            Some(marker) => {
                observation.center = Some(marker.center);
                observation.marker = Some(marker);
                self.state.center = Some(marker.center);
                self.state.center_from_marker = true;
                if self.state.calibrate(attitude, marker) {
                    observation.calibrated_now = true;
                    log::info!(
                        "rune calibrated at pitch {:.2} yaw {:.2}, hub ({:.1}, {:.1})",
                        attitude.pitch,
                        attitude.yaw,
                        marker.center.x,
                        marker.center.y
                    );
                }
            }
            None => {
                observation.center = Some(estimate);
                self.state.center = Some(estimate);
                self.state.center_from_marker = false;
            }
        }

        log::debug!(
            "rune: panel ({:.1}, {:.1}) hub {:?} phase {:?}",
            panel.center.x,
            panel.center.y,
            observation.center,
            self.state.phase()
        );
        RuneOutcome::Found(observation)
    }
}
