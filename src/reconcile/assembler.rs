// file: src/reconcile/assembler.rs
// description: builds the next persisted example list for a page from its buckets
// reference: internal reconciliation pipeline

use crate::classifier::CategoryClassifier;
use crate::models::language::{file_extension, normalize_language};
use crate::models::{Category, IncomingExample, StoredExample};
use crate::reconcile::bucket::Buckets;
use crate::reconcile::counters::{Issue, ReconciliationCounters};
use crate::reconcile::hasher::normalize_code;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Result of one reconciliation pass over a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReconciliation {
    pub page_id: String,
    /// Unchanged, updated, new, newly removed, then previously removed.
    pub examples: Vec<StoredExample>,
    pub counters: ReconciliationCounters,
    pub issues: Vec<Issue>,
}

struct Categorized {
    category: Category,
    llm_categorized: bool,
    issue: Option<Issue>,
}

pub struct StateAssembler<'a> {
    classifier: &'a dyn CategoryClassifier,
    applied_usage_min_chars: usize,
    drivers_project: bool,
}

impl<'a> StateAssembler<'a> {
    pub fn new(classifier: &'a dyn CategoryClassifier, applied_usage_min_chars: usize) -> Self {
        Self {
            classifier,
            applied_usage_min_chars,
            drivers_project: false,
        }
    }

    pub fn drivers_project(mut self, drivers_project: bool) -> Self {
        self.drivers_project = drivers_project;
        self
    }

    /// Converts the buckets into stored records.
    ///
    /// `current` must be the list the buckets were computed against, and
    /// `removed` the indices into it that no incoming example claimed.
    pub async fn assemble(
        &self,
        page_id: &str,
        current: Vec<StoredExample>,
        previously_removed: Vec<StoredExample>,
        buckets: Buckets,
        removed: Vec<usize>,
        now: DateTime<Utc>,
    ) -> PageReconciliation {
        let existing = current.len();
        let incoming = buckets.incoming_total();
        let instances = instance_counts(&buckets);
        let mut slots: Vec<Option<StoredExample>> = current.into_iter().map(Some).collect();
        let mut issues = Vec::new();

        let (updated_categories, new_categories) = futures::join!(
            join_all(
                buckets
                    .updated
                    .iter()
                    .map(|matched| self.categorize(page_id, &matched.incoming))
            ),
            join_all(
                buckets
                    .new
                    .iter()
                    .map(|fresh| self.categorize(page_id, &fresh.incoming))
            ),
        );

        let mut unchanged_out = Vec::with_capacity(buckets.unchanged.len());
        for matched in &buckets.unchanged {
            let Some(mut example) = take_slot(&mut slots, matched.existing_index) else {
                continue;
            };
            example.instances_on_page = instances.get(matched.fingerprint.as_str()).copied();
            unchanged_out.push(example);
        }

        let mut updated_out = Vec::with_capacity(buckets.updated.len());
        for (matched, categorized) in buckets.updated.iter().zip(updated_categories) {
            let Some(mut example) = take_slot(&mut slots, matched.existing_index) else {
                continue;
            };
            example.code = normalize_code(&matched.incoming.code).to_string();
            example.sha256_hash = matched.fingerprint.clone();
            example.language = normalize_language(&matched.incoming.lang).to_string();
            example.file_extension = file_extension(&matched.incoming.lang).to_string();
            example.category = categorized.category;
            example.llm_categorized = categorized.llm_categorized;
            example.date_updated = Some(now);
            example.instances_on_page = instances.get(matched.fingerprint.as_str()).copied();
            issues.extend(categorized.issue);
            updated_out.push(example);
        }

        let mut new_out = Vec::with_capacity(buckets.new.len());
        for (fresh, categorized) in buckets.new.iter().zip(new_categories) {
            new_out.push(StoredExample {
                code: normalize_code(&fresh.incoming.code).to_string(),
                language: normalize_language(&fresh.incoming.lang).to_string(),
                file_extension: file_extension(&fresh.incoming.lang).to_string(),
                category: categorized.category,
                sha256_hash: fresh.fingerprint.clone(),
                llm_categorized: categorized.llm_categorized,
                date_added: now,
                date_updated: None,
                instances_on_page: instances.get(fresh.fingerprint.as_str()).copied(),
                status: Default::default(),
            });
            issues.extend(categorized.issue);
        }

        let mut removed_out = Vec::with_capacity(removed.len());
        for index in removed {
            let Some(mut example) = take_slot(&mut slots, index) else {
                continue;
            };
            example.mark_removed(now);
            removed_out.push(example);
        }

        let new_applied_usage = new_out
            .iter()
            .filter(|example| self.is_applied_usage(example))
            .count();

        let counters = ReconciliationCounters {
            incoming,
            existing,
            unchanged: unchanged_out.len(),
            updated: updated_out.len(),
            new: new_out.len(),
            removed: removed_out.len(),
            assembled: unchanged_out.len() + updated_out.len() + new_out.len() + removed_out.len(),
            new_applied_usage,
        };
        issues.extend(counters.check_invariants(page_id));

        debug!(
            page_id,
            unchanged = counters.unchanged,
            updated = counters.updated,
            new = counters.new,
            removed = counters.removed,
            "Assembled page"
        );

        let mut examples = unchanged_out;
        examples.extend(updated_out);
        examples.extend(new_out);
        examples.extend(removed_out);
        examples.extend(previously_removed);

        PageReconciliation {
            page_id: page_id.to_string(),
            examples,
            counters,
            issues,
        }
    }

    /// A new usage example long enough to show a complete task.
    pub fn is_applied_usage(&self, example: &StoredExample) -> bool {
        example.category == Category::UsageExample
            && example.code.chars().count() > self.applied_usage_min_chars
    }

    async fn categorize(&self, page_id: &str, incoming: &IncomingExample) -> Categorized {
        let code = normalize_code(&incoming.code);
        let language = normalize_language(&incoming.lang);
        match self
            .classifier
            .classify(code, language, self.drivers_project)
            .await
        {
            Ok(outcome) => Categorized {
                category: outcome.category,
                llm_categorized: !outcome.was_heuristic,
                issue: None,
            },
            Err(e) => {
                warn!(page_id, line = incoming.line, "Leaving example uncategorized: {}", e);
                Categorized {
                    category: Category::Uncategorized,
                    llm_categorized: true,
                    issue: Some(Issue::classifier_failure(page_id, incoming.line, e.to_string())),
                }
            }
        }
    }
}

fn take_slot(slots: &mut [Option<StoredExample>], index: usize) -> Option<StoredExample> {
    slots.get_mut(index).and_then(Option::take)
}

/// How many incoming examples on the page share each fingerprint.
fn instance_counts(buckets: &Buckets) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    let fingerprints = buckets
        .unchanged
        .iter()
        .chain(buckets.updated.iter())
        .map(|matched| matched.fingerprint.as_str())
        .chain(buckets.new.iter().map(|fresh| fresh.fingerprint.as_str()));
    for fingerprint in fingerprints {
        *counts.entry(fingerprint).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{CategoryOutcome, MockCategoryClassifier};
    use crate::error::AuditError;
    use crate::models::ExampleStatus;
    use crate::reconcile::bucket::BucketClassifier;
    use crate::reconcile::counters::IssueKind;
    use crate::reconcile::hasher::fingerprint;
    use crate::reconcile::removal::RemovalDetector;
    use crate::reconcile::similarity::SimilarityComparator;
    use chrono::TimeZone;

    fn added_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn run_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn stored(code: &str, category: Category) -> StoredExample {
        StoredExample {
            code: code.to_string(),
            language: "python".to_string(),
            file_extension: ".py".to_string(),
            category,
            sha256_hash: fingerprint(code),
            llm_categorized: false,
            date_added: added_at(),
            date_updated: None,
            instances_on_page: Some(1),
            status: ExampleStatus::Active,
        }
    }

    fn classifier_returning(category: Category, times: usize) -> MockCategoryClassifier {
        let mut classifier = MockCategoryClassifier::new();
        classifier
            .expect_classify()
            .times(times)
            .returning(move |_, _, _| Ok(CategoryOutcome::fallback(category)));
        classifier
    }

    async fn assemble(
        classifier: &dyn CategoryClassifier,
        current: Vec<StoredExample>,
        incoming: Vec<IncomingExample>,
    ) -> PageReconciliation {
        let buckets = BucketClassifier::new(&current, SimilarityComparator::default())
            .partition(incoming);
        let removed = RemovalDetector::detect(&current, &buckets);
        StateAssembler::new(classifier, 300)
            .assemble("page", current, Vec::new(), buckets, removed, run_at())
            .await
    }

    #[tokio::test]
    async fn test_unchanged_keeps_metadata() {
        let classifier = classifier_returning(Category::UsageExample, 0);
        let existing = stored("A", Category::SyntaxExample);

        let page = assemble(
            &classifier,
            vec![existing.clone()],
            vec![IncomingExample::new("A", "python")],
        )
        .await;

        assert_eq!(page.examples, vec![existing]);
        assert_eq!(page.counters.unchanged, 1);
        assert!(page.issues.is_empty());
    }

    #[tokio::test]
    async fn test_updated_refreshes_content_and_keeps_date_added() {
        let classifier = classifier_returning(Category::UsageExample, 1);

        let page = assemble(
            &classifier,
            vec![stored("print('hi')", Category::SyntaxExample)],
            vec![IncomingExample::new("print('hello')\n", "py")],
        )
        .await;

        assert_eq!(page.counters.updated, 1);
        let example = &page.examples[0];
        assert_eq!(example.code, "print('hello')");
        assert_eq!(example.sha256_hash, fingerprint("print('hello')"));
        assert_eq!(example.category, Category::UsageExample);
        assert!(example.llm_categorized);
        assert_eq!(example.date_added, added_at());
        assert_eq!(example.date_updated, Some(run_at()));
        // unknown tags normalize to undefined
        assert_eq!(example.language, "undefined");
    }

    #[tokio::test]
    async fn test_new_example_invokes_classifier_once() {
        let mut classifier = MockCategoryClassifier::new();
        classifier
            .expect_classify()
            .withf(|code, language, drivers_project| {
                code.contains('Y') && language.contains("shell") && !drivers_project
            })
            .times(1)
            .returning(|_, _, _| Ok(CategoryOutcome::heuristic(Category::NonMongoCommand)));

        let page = assemble(&classifier, Vec::new(), vec![IncomingExample::new("Y", "sh")]).await;

        assert_eq!(page.counters.new, 1);
        let example = &page.examples[0];
        assert_eq!(example.language, "shell");
        assert_eq!(example.file_extension, ".sh");
        assert!(!example.llm_categorized);
        assert_eq!(example.date_added, run_at());
        assert_eq!(example.instances_on_page, Some(1));
    }

    #[tokio::test]
    async fn test_drivers_project_is_passed_to_classifier() {
        let mut classifier = MockCategoryClassifier::new();
        classifier
            .expect_classify()
            .withf(|_, language, drivers_project| language.contains("javascript") && *drivers_project)
            .times(1)
            .returning(|_, _, _| Ok(CategoryOutcome::fallback(Category::UsageExample)));

        let incoming = vec![IncomingExample::new("const db = client.db('sample');", "js")];
        let buckets = BucketClassifier::new(&[], SimilarityComparator::default()).partition(incoming);
        let page = StateAssembler::new(&classifier, 300)
            .drivers_project(true)
            .assemble("page", Vec::new(), Vec::new(), buckets, Vec::new(), run_at())
            .await;

        assert_eq!(page.examples[0].category, Category::UsageExample);
    }

    #[tokio::test]
    async fn test_removed_is_marked_not_dropped() {
        let classifier = classifier_returning(Category::UsageExample, 0);

        let page = assemble(&classifier, vec![stored("X", Category::SyntaxExample)], Vec::new()).await;

        assert_eq!(page.counters.removed, 1);
        assert_eq!(page.examples.len(), 1);
        assert_eq!(page.examples[0].removed_at(), Some(run_at()));
        assert_eq!(page.examples[0].instances_on_page, None);
    }

    #[tokio::test]
    async fn test_output_order_is_unchanged_updated_new_removed() {
        let classifier = classifier_returning(Category::SyntaxExample, 2);

        let page = assemble(
            &classifier,
            vec![
                stored("value = 10", Category::SyntaxExample),
                stored("to_be_removed_entirely()", Category::SyntaxExample),
                stored("kept_as_is()", Category::SyntaxExample),
            ],
            vec![
                IncomingExample::new("{\"brand\": \"new\"}", "json"),
                IncomingExample::new("value = 11", "python"),
                IncomingExample::new("kept_as_is()", "python"),
            ],
        )
        .await;

        let codes: Vec<&str> = page.examples.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(
            codes,
            vec![
                "kept_as_is()",
                "value = 11",
                "{\"brand\": \"new\"}",
                "to_be_removed_entirely()"
            ]
        );
        assert!(page.examples[3].is_removed());
    }

    #[tokio::test]
    async fn test_classifier_failure_is_uncategorized_with_issue() {
        let mut classifier = MockCategoryClassifier::new();
        classifier
            .expect_classify()
            .times(1)
            .returning(|_, _, _| Err(AuditError::Classifier("model offline".to_string())));

        let page = assemble(
            &classifier,
            Vec::new(),
            vec![IncomingExample::new("client.close()", "python").at_line(42)],
        )
        .await;

        assert_eq!(page.examples[0].category, Category::Uncategorized);
        assert!(page.examples[0].llm_categorized);
        assert_eq!(page.issues.len(), 1);
        assert!(matches!(
            &page.issues[0].kind,
            IssueKind::ClassifierFailure { line: 42, .. }
        ));
    }

    #[tokio::test]
    async fn test_applied_usage_counts_long_new_usage_examples() {
        let classifier = classifier_returning(Category::UsageExample, 2);
        let long_example = format!("client = connect()\n{}", "collection.insert_one(doc)\n".repeat(15));

        let page = assemble(
            &classifier,
            Vec::new(),
            vec![
                IncomingExample::new(long_example, "python"),
                IncomingExample::new("short()", "python"),
            ],
        )
        .await;

        assert_eq!(page.counters.new, 2);
        assert_eq!(page.counters.new_applied_usage, 1);
    }

    #[tokio::test]
    async fn test_instances_count_duplicate_snippets() {
        let classifier = classifier_returning(Category::UsageExample, 1);

        let page = assemble(
            &classifier,
            vec![stored("dup()", Category::SyntaxExample)],
            vec![
                IncomingExample::new("dup()", "python"),
                IncomingExample::new("dup()", "python"),
            ],
        )
        .await;

        assert_eq!(page.counters.unchanged, 1);
        assert_eq!(page.counters.new, 1);
        assert!(page.examples.iter().all(|e| e.instances_on_page == Some(2)));
    }

    #[tokio::test]
    async fn test_previously_removed_carried_to_the_end() {
        let classifier = classifier_returning(Category::UsageExample, 0);
        let mut gone = stored("gone()", Category::SyntaxExample);
        gone.mark_removed(added_at());
        let current = vec![stored("here()", Category::SyntaxExample)];

        let buckets = BucketClassifier::new(&current, SimilarityComparator::default())
            .partition(vec![IncomingExample::new("here()", "python")]);
        let removed = RemovalDetector::detect(&current, &buckets);
        let page = StateAssembler::new(&classifier, 300)
            .assemble("page", current, vec![gone.clone()], buckets, removed, run_at())
            .await;

        assert_eq!(page.examples.len(), 2);
        assert_eq!(page.examples[1], gone);
        assert_eq!(page.counters.assembled, 1);
        assert!(page.issues.is_empty());
    }
}
