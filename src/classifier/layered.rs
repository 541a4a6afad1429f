// file: src/classifier/layered.rs
// description: rule heuristics first, then a rate-limited fallback classifier
// reference: https://docs.rs/tokio/latest/tokio/sync/struct.Semaphore.html

use crate::classifier::rules::RuleClassifier;
use crate::classifier::{CategoryClassifier, CategoryOutcome};
use crate::error::{AuditError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

pub struct LayeredClassifier {
    rules: RuleClassifier,
    fallback: Option<Arc<dyn CategoryClassifier>>,
    permits: Arc<Semaphore>,
}

impl LayeredClassifier {
    /// `max_in_flight` caps concurrent fallback calls across every page worker
    /// sharing this classifier.
    pub fn new(fallback: Option<Arc<dyn CategoryClassifier>>, max_in_flight: usize) -> Self {
        Self {
            rules: RuleClassifier::new(),
            fallback,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn rules_only() -> Self {
        Self::new(None, 1)
    }
}

#[async_trait]
impl CategoryClassifier for LayeredClassifier {
    async fn classify(
        &self,
        code: &str,
        language: &str,
        drivers_project: bool,
    ) -> Result<CategoryOutcome> {
        if let Some(category) = self.rules.categorize(code, language) {
            return Ok(CategoryOutcome::heuristic(category));
        }

        let Some(fallback) = &self.fallback else {
            return Err(AuditError::Classifier(
                "no rule matched and the fallback classifier is disabled".to_string(),
            ));
        };

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AuditError::Classifier(format!("Classifier limiter closed: {}", e)))?;
        debug!(
            available = self.permits.available_permits(),
            "Calling fallback classifier"
        );
        fallback.classify(code, language, drivers_project).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MockCategoryClassifier;
    use crate::models::Category;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_rules_answer_without_fallback() {
        let mut fallback = MockCategoryClassifier::new();
        fallback.expect_classify().times(0);
        let classifier = LayeredClassifier::new(Some(Arc::new(fallback)), 2);

        let outcome = classifier.classify("npm install", "shell", false).await.unwrap();
        assert_eq!(outcome, CategoryOutcome::heuristic(Category::NonMongoCommand));
    }

    #[tokio::test]
    async fn test_fallback_used_when_rules_undecided() {
        let mut fallback = MockCategoryClassifier::new();
        fallback
            .expect_classify()
            .times(1)
            .returning(|_, _, _| Ok(CategoryOutcome::fallback(Category::SyntaxExample)));
        let classifier = LayeredClassifier::new(Some(Arc::new(fallback)), 2);

        let outcome = classifier.classify("client.close()", "python", false).await.unwrap();
        assert_eq!(outcome.category, Category::SyntaxExample);
        assert!(!outcome.was_heuristic);
    }

    #[tokio::test]
    async fn test_disabled_fallback_is_an_error() {
        let classifier = LayeredClassifier::rules_only();
        let result = classifier.classify("client.close()", "python", false).await;
        assert!(matches!(result, Err(AuditError::Classifier(_))));
    }

    #[tokio::test]
    async fn test_drivers_project_flag_reaches_fallback() {
        let mut fallback = MockCategoryClassifier::new();
        fallback
            .expect_classify()
            .withf(|_, language, drivers_project| language.contains("javascript") && *drivers_project)
            .times(1)
            .returning(|_, _, _| Ok(CategoryOutcome::fallback(Category::UsageExample)));
        let classifier = LayeredClassifier::new(Some(Arc::new(fallback)), 1);

        let outcome = classifier
            .classify("const client = new MongoClient(uri);", "javascript", true)
            .await
            .unwrap();
        assert_eq!(outcome.category, Category::UsageExample);
    }

    struct SlowClassifier {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl CategoryClassifier for SlowClassifier {
        async fn classify(
            &self,
            _code: &str,
            _language: &str,
            _drivers_project: bool,
        ) -> Result<CategoryOutcome> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(CategoryOutcome::fallback(Category::UsageExample))
        }
    }

    #[tokio::test]
    async fn test_fallback_concurrency_is_capped() {
        let slow = Arc::new(SlowClassifier {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let classifier = LayeredClassifier::new(Some(slow.clone()), 2);

        let calls = (0..6).map(|_| classifier.classify("client.close()", "python", false));
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert!(slow.peak.load(Ordering::SeqCst) <= 2);
    }
}
