use gimbal_vision_core::{GimbalAttitude, RotatedShape};
use nalgebra::Point2;

/// Progress of one rune engagement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunePhase {
    Searching,
    /// Panel and fan seen; the hub is only a geometric estimate.
    FoundPanelAndFan,
    /// Hub located on its marker, attitude not yet captured.
    CenterEstimated,
    Calibrated,
}

/// One-shot capture taken the first time the hub marker is located.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    /// Attitude at the capture instant; the aiming origin.
    pub origin: GimbalAttitude,
    /// Marker shape in frame coordinates.
    pub marker: RotatedShape,
}

/// What the rune tracker knows so far.
///
/// Shapes persist across frames until replaced. `calibration` is set at
/// most once and only cleared by `reset`.
#[derive(Clone, Debug, Default)]
pub struct EnergyTargetState {
    pub panel: Option<RotatedShape>,
    pub fan: Option<RotatedShape>,
    /// Latest hub position: marker center when found, otherwise the
    /// geometric estimate.
    pub center: Option<Point2<f32>>,
    /// Whether `center` came from the marker.
    pub center_from_marker: bool,
    calibration: Option<Calibration>,
}

impl EnergyTargetState {
    pub fn phase(&self) -> RunePhase {
        if self.calibration.is_some() {
            RunePhase::Calibrated
        } else if self.center.is_some() && self.center_from_marker {
            RunePhase::CenterEstimated
        } else if self.panel.is_some() && self.fan.is_some() {
            RunePhase::FoundPanelAndFan
        } else {
            RunePhase::Searching
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Record the origin unless one is already held. Returns true when this
    /// call performed the capture.
    pub fn calibrate(&mut self, origin: GimbalAttitude, marker: RotatedShape) -> bool {
        if self.calibration.is_some() {
            return false;
        }
        self.calibration = Some(Calibration { origin, marker });
        true
    }

    /// Forget everything, including the calibration. Called on mode change.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_with_knowledge() {
        let mut s = EnergyTargetState::default();
        assert_eq!(s.phase(), RunePhase::Searching);

        s.panel = Some(RotatedShape::default());
        s.fan = Some(RotatedShape::default());
        s.center = Some(Point2::new(1.0, 2.0));
        assert_eq!(s.phase(), RunePhase::FoundPanelAndFan);

        s.center_from_marker = true;
        assert_eq!(s.phase(), RunePhase::CenterEstimated);

        assert!(s.calibrate(GimbalAttitude::new(3.0, 4.0), RotatedShape::default()));
        assert_eq!(s.phase(), RunePhase::Calibrated);
    }

    #[test]
    fn calibration_is_captured_once() {
        let mut s = EnergyTargetState::default();
        assert!(s.calibrate(GimbalAttitude::new(1.0, 2.0), RotatedShape::default()));
        assert!(!s.calibrate(GimbalAttitude::new(9.0, 9.0), RotatedShape::default()));
        assert_eq!(s.calibration().map(|c| c.origin), Some(GimbalAttitude::new(1.0, 2.0)));

        s.reset();
        assert!(!s.is_calibrated());
        assert_eq!(s.phase(), RunePhase::Searching);
    }
}
