// file: src/classifier/mod.rs
// description: category classification capability used when assembling examples
// reference: https://docs.rs/async-trait

pub mod layered;
pub mod llm;
pub mod rules;

use crate::error::Result;
use crate::models::Category;
use async_trait::async_trait;

pub use layered::LayeredClassifier;
pub use llm::OllamaClassifier;
pub use rules::{LanguageGroup, RuleClassifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryOutcome {
    pub category: Category,
    /// True when local rules decided the category without the fallback model.
    pub was_heuristic: bool,
}

impl CategoryOutcome {
    pub fn heuristic(category: Category) -> Self {
        Self {
            category,
            was_heuristic: true,
        }
    }

    pub fn fallback(category: Category) -> Self {
        Self {
            category,
            was_heuristic: false,
        }
    }
}

/// Assigns a category to a code example.
///
/// Output is best effort and may vary between calls for the same text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    /// `language` is the canonical language name of the example.
    /// `drivers_project` is set for driver documentation, where JavaScript
    /// and plain text snippets are judged as driver code.
    async fn classify(
        &self,
        code: &str,
        language: &str,
        drivers_project: bool,
    ) -> Result<CategoryOutcome>;
}
