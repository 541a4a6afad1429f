// file: src/reconcile/similarity.rs
// description: percentage edit-distance comparison between two code bodies
// reference: https://docs.rs/strsim

use crate::reconcile::hasher::normalize_code;

/// Decides whether an incoming code body is an edited version of a stored one.
///
/// The change percentage is the character-level Levenshtein distance divided by
/// the stored body's length. This is a heuristic: two unrelated one-liners can
/// land under the threshold, and a heavy rewrite of a real example can land
/// over it. Both outcomes are accepted approximations.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityComparator {
    threshold_percent: f64,
}

impl SimilarityComparator {
    pub fn new(threshold_percent: f64) -> Self {
        Self { threshold_percent }
    }

    pub fn threshold_percent(&self) -> f64 {
        self.threshold_percent
    }

    /// Percentage of the stored body changed to produce the candidate.
    /// `None` when the stored body is empty and no percentage exists.
    pub fn change_percentage(&self, stored: &str, candidate: &str) -> Option<f64> {
        let stored = normalize_code(stored);
        let candidate = normalize_code(candidate);

        let stored_len = stored.chars().count();
        if stored_len == 0 {
            return None;
        }

        let distance = strsim::levenshtein(stored, candidate);
        Some(distance as f64 / stored_len as f64 * 100.0)
    }

    pub fn is_near_duplicate(&self, stored: &str, candidate: &str) -> bool {
        let stored_len = normalize_code(stored).chars().count();
        if stored_len == 0 {
            return false;
        }

        // The distance is at least the length difference, so skip the
        // quadratic comparison when that alone is over the threshold.
        let candidate_len = normalize_code(candidate).chars().count();
        let floor = stored_len.abs_diff(candidate_len) as f64 / stored_len as f64 * 100.0;
        if floor > self.threshold_percent {
            return false;
        }

        self.change_percentage(stored, candidate)
            .is_some_and(|percent| percent <= self.threshold_percent)
    }
}

impl Default for SimilarityComparator {
    fn default() -> Self {
        Self::new(50.0)
    }
}
