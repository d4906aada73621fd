//! Armor-plate detection from a color frame.
//!
//! Pipeline:
//! 1. `preprocess`: luminance and color-difference thresholds, ANDed and
//!    closed into a binary mask.
//! 2. `find_lightbars`: external contours, minimum-area rectangles, area
//!    filter, upright normalization.
//! 3. `match_lightbars`: every pair is measured, gated and scored; accepted
//!    pairs become [`ArmorCandidate`]s with a rectified digit patch.
//! 4. `select_target`: score ranking, bounded classification, priority
//!    ranking.
//!
//! [`ArmorDetector`] runs all four and keeps the region-of-interest window
//! between frames.

mod candidate;
mod classifier;
mod detector;
mod lightbar;
mod matcher;
mod params;
mod preprocess;
mod selector;

pub use candidate::{gamma_correct, priority_for, ArmorCandidate};
pub use classifier::{FixedClassifier, NumberClassifier};
pub use detector::ArmorDetector;
pub use lightbar::find_lightbars;
pub use matcher::{match_lightbars, PairMetrics};
pub use params::{ArmorParams, GammaParams};
pub use preprocess::preprocess;
pub use selector::select_target;
