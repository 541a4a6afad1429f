// file: src/reconcile/removal.rs
// description: finds stored examples no incoming example claimed
// reference: internal reconciliation pipeline

use crate::models::StoredExample;
use crate::reconcile::bucket::Buckets;

pub struct RemovalDetector;

impl RemovalDetector {
    /// Indices of current stored examples left unclaimed by the unchanged and
    /// updated buckets, in stored order. New examples claim nothing.
    ///
    /// Previously removed examples must already be split out of `existing`.
    pub fn detect(existing: &[StoredExample], buckets: &Buckets) -> Vec<usize> {
        let mut claimed = vec![false; existing.len()];
        for matched in buckets.unchanged.iter().chain(buckets.updated.iter()) {
            if let Some(slot) = claimed.get_mut(matched.existing_index) {
                *slot = true;
            }
        }

        claimed
            .iter()
            .enumerate()
            .filter(|(_, claimed)| !**claimed)
            .map(|(index, _)| index)
            .collect()
    }
}
