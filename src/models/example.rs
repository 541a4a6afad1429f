// file: src/models/example.rs
// description: persisted and incoming code example models
// reference: internal data structures

use crate::models::category::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a stored example is still present on its page.
///
/// Removal is a state transition, never a deletion: removed examples stay in
/// the page's list so historical counts remain auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExampleStatus {
    #[default]
    Active,
    Removed { removed_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredExample {
    pub code: String,
    pub language: String,
    pub file_extension: String,
    pub category: Category,
    pub sha256_hash: String,
    pub llm_categorized: bool,
    pub date_added: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances_on_page: Option<usize>,
    #[serde(default)]
    pub status: ExampleStatus,
}

impl StoredExample {
    pub fn is_removed(&self) -> bool {
        matches!(self.status, ExampleStatus::Removed { .. })
    }

    pub fn removed_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            ExampleStatus::Removed { removed_at } => Some(removed_at),
            ExampleStatus::Active => None,
        }
    }

    pub fn mark_removed(&mut self, at: DateTime<Utc>) {
        self.status = ExampleStatus::Removed { removed_at: at };
        self.instances_on_page = None;
    }
}

/// A code example parsed out of the current source AST. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingExample {
    pub code: String,
    pub lang: String,
    pub line: usize,
}

impl IncomingExample {
    pub fn new(code: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            lang: lang.into(),
            line: 0,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

/// Splits a stored page into examples still on the page and examples
/// removed by an earlier run. Order is preserved within each half.
pub fn split_current_removed(examples: Vec<StoredExample>) -> (Vec<StoredExample>, Vec<StoredExample>) {
    examples.into_iter().partition(|example| !example.is_removed())
}
