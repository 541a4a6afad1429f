// file: src/reconcile/mod.rs
// description: code example reconciliation engine
// reference: internal module structure

pub mod assembler;
pub mod bucket;
pub mod counters;
pub mod hasher;
pub mod removal;
pub mod similarity;

pub use assembler::{PageReconciliation, StateAssembler};
pub use bucket::{Bucket, BucketClassifier, Buckets, Classification, HashMultiset};
pub use counters::{Issue, IssueKind, ReconciliationCounters};
pub use hasher::fingerprint;
pub use removal::RemovalDetector;
pub use similarity::SimilarityComparator;

use crate::classifier::CategoryClassifier;
use crate::config::ReconcileConfig;
use crate::models::{IncomingExample, StoredExample, split_current_removed};
use chrono::{DateTime, Utc};

/// Runs one reconciliation pass for a page: bucket the incoming examples
/// against the stored ones, find removals, and assemble the next list.
#[allow(clippy::too_many_arguments)]
pub async fn reconcile_page(
    page_id: &str,
    stored: Vec<StoredExample>,
    incoming: Vec<IncomingExample>,
    classifier: &dyn CategoryClassifier,
    config: &ReconcileConfig,
    drivers_project: bool,
    now: DateTime<Utc>,
) -> PageReconciliation {
    let (current, previously_removed) = split_current_removed(stored);

    let comparator = SimilarityComparator::new(config.similarity_threshold_percent);
    let buckets = BucketClassifier::new(&current, comparator).partition(incoming);
    let removed = RemovalDetector::detect(&current, &buckets);

    StateAssembler::new(classifier, config.applied_usage_min_chars)
        .drivers_project(drivers_project)
        .assemble(page_id, current, previously_removed, buckets, removed, now)
        .await
}
