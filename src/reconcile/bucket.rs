// file: src/reconcile/bucket.rs
// description: classifies incoming code examples as unchanged, updated, or new
// reference: content-fingerprint identity with a similarity fallback

use crate::models::{IncomingExample, StoredExample};
use crate::reconcile::hasher::fingerprint;
use crate::reconcile::similarity::SimilarityComparator;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Unchanged,
    Updated,
    New,
}

/// Outcome for a single incoming example. `matched` indexes the stored
/// example it claimed, and is `None` exactly when the bucket is `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub bucket: Bucket,
    pub matched: Option<usize>,
}

/// Stored fingerprints with multiplicity, built once per page.
///
/// Each fingerprint maps to the stored indices carrying it, in page order, so
/// a page showing the same snippet twice needs two incoming copies to claim
/// both records.
#[derive(Debug, Clone, Default)]
pub struct HashMultiset {
    by_hash: HashMap<String, VecDeque<usize>>,
}

impl HashMultiset {
    pub fn from_examples(existing: &[StoredExample]) -> Self {
        let mut by_hash: HashMap<String, VecDeque<usize>> = HashMap::new();
        for (index, example) in existing.iter().enumerate() {
            by_hash
                .entry(example.sha256_hash.clone())
                .or_default()
                .push_back(index);
        }
        Self { by_hash }
    }

    pub fn count(&self, hash: &str) -> usize {
        self.by_hash.get(hash).map_or(0, VecDeque::len)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.count(hash) > 0
    }

    fn pop(&mut self, hash: &str) -> Option<usize> {
        let queue = self.by_hash.get_mut(hash)?;
        let index = queue.pop_front();
        if queue.is_empty() {
            self.by_hash.remove(hash);
        }
        index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedExample {
    pub incoming: IncomingExample,
    pub fingerprint: String,
    pub existing_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExample {
    pub incoming: IncomingExample,
    pub fingerprint: String,
}

/// The three incoming-derived buckets for one page, each in incoming order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    pub unchanged: Vec<MatchedExample>,
    pub updated: Vec<MatchedExample>,
    pub new: Vec<NewExample>,
}

impl Buckets {
    pub fn incoming_total(&self) -> usize {
        self.unchanged.len() + self.updated.len() + self.new.len()
    }
}

pub struct BucketClassifier<'a> {
    existing: &'a [StoredExample],
    hashes: HashMultiset,
    claimed: Vec<bool>,
    comparator: SimilarityComparator,
}

impl<'a> BucketClassifier<'a> {
    pub fn new(existing: &'a [StoredExample], comparator: SimilarityComparator) -> Self {
        Self {
            existing,
            hashes: HashMultiset::from_examples(existing),
            claimed: vec![false; existing.len()],
            comparator,
        }
    }

    /// Classifies one incoming example against the stored examples not yet
    /// claimed in this pass, claiming the match if there is one.
    ///
    /// An exact fingerprint match is unchanged. Otherwise the first unclaimed
    /// stored example, in page order, within the similarity threshold is
    /// updated. Anything else is new.
    pub fn classify(&mut self, incoming: &IncomingExample) -> Classification {
        let hash = fingerprint(&incoming.code);
        self.classify_hashed(incoming, &hash)
    }

    fn classify_hashed(&mut self, incoming: &IncomingExample, hash: &str) -> Classification {
        if let Some(index) = self.claim_exact(hash) {
            return Classification {
                bucket: Bucket::Unchanged,
                matched: Some(index),
            };
        }

        if let Some(index) = self.claim_similar(&incoming.code) {
            return Classification {
                bucket: Bucket::Updated,
                matched: Some(index),
            };
        }

        Classification {
            bucket: Bucket::New,
            matched: None,
        }
    }

    /// Buckets a whole page.
    ///
    /// Exact matches are claimed for every incoming example before any
    /// similarity matching runs, so an edited snippet early on the page cannot
    /// steal the stored record of an untouched snippet further down.
    pub fn partition(mut self, incoming: Vec<IncomingExample>) -> Buckets {
        let mut buckets = Buckets::default();
        let mut pending = Vec::new();

        for example in incoming {
            let hash = fingerprint(&example.code);
            match self.claim_exact(&hash) {
                Some(existing_index) => buckets.unchanged.push(MatchedExample {
                    incoming: example,
                    fingerprint: hash,
                    existing_index,
                }),
                None => pending.push((example, hash)),
            }
        }

        for (example, hash) in pending {
            let classification = self.classify_hashed(&example, &hash);
            match (classification.bucket, classification.matched) {
                (Bucket::New, _) | (_, None) => buckets.new.push(NewExample {
                    incoming: example,
                    fingerprint: hash,
                }),
                (Bucket::Unchanged, Some(existing_index)) => {
                    buckets.unchanged.push(MatchedExample {
                        incoming: example,
                        fingerprint: hash,
                        existing_index,
                    })
                }
                (Bucket::Updated, Some(existing_index)) => {
                    buckets.updated.push(MatchedExample {
                        incoming: example,
                        fingerprint: hash,
                        existing_index,
                    })
                }
            }
        }

        debug!(
            unchanged = buckets.unchanged.len(),
            updated = buckets.updated.len(),
            new = buckets.new.len(),
            "Bucketed incoming examples"
        );

        buckets
    }

    fn claim_exact(&mut self, hash: &str) -> Option<usize> {
        while let Some(index) = self.hashes.pop(hash) {
            if !self.claimed[index] {
                self.claimed[index] = true;
                return Some(index);
            }
        }
        None
    }

    fn claim_similar(&mut self, code: &str) -> Option<usize> {
        let index = self
            .existing
            .iter()
            .enumerate()
            .find(|(index, stored)| {
                !self.claimed[*index] && self.comparator.is_near_duplicate(&stored.code, code)
            })
            .map(|(index, _)| index)?;
        self.claimed[index] = true;
        Some(index)
    }
}
