use crate::candidate::ArmorCandidate;
use crate::classifier::NumberClassifier;

/// Pick the target to engage.
///
/// Candidates are ranked by score (ascending), the best `max_candidates`
/// are classified, and the list is re-ranked by priority (descending).
/// Both sorts are stable, so equal priorities keep score order and
/// unclassified candidates trail classified ones of the same priority.
pub fn select_target(
    mut candidates: Vec<ArmorCandidate>,
    classifier: &dyn NumberClassifier,
    max_candidates: usize,
) -> Option<ArmorCandidate> {
    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));

    for candidate in candidates.iter_mut().take(max_candidates) {
        let number = classifier.predict(&candidate.patch);
        candidate.set_number(number);
    }

    candidates.sort_by(|a, b| b.priority().cmp(&a.priority()));
    candidates.into_iter().next()
}
