use gimbal_vision_core::{EnemyColor, PixelRect};
use image::RgbImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::candidate::ArmorCandidate;
use crate::classifier::{FixedClassifier, NumberClassifier};
use crate::lightbar::find_lightbars;
use crate::matcher::match_lightbars;
use crate::params::ArmorParams;
use crate::preprocess::preprocess;
use crate::selector::select_target;

/// Armor detector with region-of-interest tracking.
///
/// The ROI is the only state carried between frames: after a hit it is
/// twice the target's bounding box, centered on it and clamped to the
/// frame; after a miss it is empty and the next frame is searched whole.
pub struct ArmorDetector {
    params: ArmorParams,
    classifier: Box<dyn NumberClassifier>,
    roi: PixelRect,
}

impl ArmorDetector {
    pub fn new(params: ArmorParams) -> Self {
        Self {
            params,
            classifier: Box::new(FixedClassifier::default()),
            roi: PixelRect::EMPTY,
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn NumberClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn params(&self) -> &ArmorParams {
        &self.params
    }

    /// Current search window in frame coordinates; empty means full frame.
    pub fn roi(&self) -> PixelRect {
        self.roi
    }

    pub fn reset_roi(&mut self) {
        self.roi = PixelRect::EMPTY;
    }

    /// Find the best armor plate in `frame`.
    ///
    /// The returned candidate's shape is in full-frame coordinates; its
    /// digit patch was cut from the searched window.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip(self, frame),
            fields(w = frame.width(), h = frame.height(), roi = ?self.roi)
        )
    )]
    pub fn detect(&mut self, frame: &RgbImage, color: EnemyColor) -> Option<ArmorCandidate> {
        let (fw, fh) = frame.dimensions();
        let window = self
            .params
            .roi_enabled
            .then(|| self.roi.intersect_image(fw, fh))
            .flatten();

        let cropped;
        let (search, origin) = match window.and_then(|w| Some((w.crop(frame)?, w))) {
            Some((img, w)) => {
                cropped = img;
                (&cropped, (w.x, w.y))
            }
            None => (frame, (0, 0)),
        };

        let mask = preprocess(search, color, &self.params);
        let lightbars = find_lightbars(&mask, self.params.min_lightbar_area);
        let candidates = match_lightbars(&lightbars, color, search, &self.params);
        log::debug!(
            "armor: {} lightbars, {} candidates in {}x{} at {:?}",
            lightbars.len(),
            candidates.len(),
            search.width(),
            search.height(),
            origin
        );

        let Some(mut target) = select_target(
            candidates,
            self.classifier.as_ref(),
            self.params.max_candidates,
        ) else {
            self.roi = PixelRect::EMPTY;
            return None;
        };

        target.shape = target.shape.translated(origin.0 as f32, origin.1 as f32);
        self.roi = if self.params.roi_enabled {
            target.bounding_rect().doubled_within(fw, fh)
        } else {
            PixelRect::EMPTY
        };
        Some(target)
    }
}
