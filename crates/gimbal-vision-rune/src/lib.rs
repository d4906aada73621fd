//! Energy rune tracking.
//!
//! The rune is a rotating wheel. Each frame the lit panel and the pointer
//! ("fan") leading from it towards the hub are segmented, the hub is
//! estimated from their geometry and refined against the small marker
//! printed on it. The first time the marker is seen the turret attitude is
//! recorded as the aiming origin for the rest of the engagement.

mod center;
mod detector;
mod params;
mod preprocess;
mod search;
mod state;

pub use center::estimate_center;
pub use detector::{RuneDetector, RuneObservation, RuneOutcome};
pub use params::RuneParams;
pub use preprocess::{recover_panels, segment};
pub use search::{find_fan, find_marker, find_panel};
pub use state::{Calibration, EnergyTargetState, RunePhase};
