use image::RgbImage;

/// Digit recognizer for armor patches.
///
/// Returns the digit class, 0 when unknown. Implementations must not fail;
/// anything that goes wrong maps to 0.
pub trait NumberClassifier: Send {
    fn predict(&self, patch: &RgbImage) -> u8;
}

/// Reports the same class for every patch.
///
/// Stand-in used when no recognition model is deployed; the default class
/// is 1, which carries the highest priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClassifier(pub u8);

impl Default for FixedClassifier {
    fn default() -> Self {
        Self(1)
    }
}

impl NumberClassifier for FixedClassifier {
    fn predict(&self, _patch: &RgbImage) -> u8 {
        self.0
    }
}

impl<F> NumberClassifier for F
where
    F: Fn(&RgbImage) -> u8 + Send,
{
    fn predict(&self, patch: &RgbImage) -> u8 {
        self(patch)
    }
}
