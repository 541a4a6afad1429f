// file: src/reconcile/counters.rs
// description: per-page reconciliation counters, invariant checks, and issue records
// reference: internal reconciliation pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationCounters {
    pub incoming: usize,
    /// Current (not previously removed) stored examples going into the pass.
    pub existing: usize,
    pub unchanged: usize,
    pub updated: usize,
    pub new: usize,
    pub removed: usize,
    /// Assembled records excluding examples removed by earlier runs.
    pub assembled: usize,
    pub new_applied_usage: usize,
}

impl ReconciliationCounters {
    /// Checks the bucket arithmetic and returns one issue per failed check.
    /// A failed check never stops the page from being written.
    pub fn check_invariants(&self, page_id: &str) -> Vec<Issue> {
        let checks = [
            (
                "unchanged + updated + new == incoming",
                self.incoming,
                self.unchanged + self.updated + self.new,
            ),
            (
                "assembled - removed == incoming",
                self.incoming,
                self.assembled.saturating_sub(self.removed),
            ),
            (
                "unchanged + updated + removed == existing",
                self.existing,
                self.unchanged + self.updated + self.removed,
            ),
        ];

        checks
            .into_iter()
            .filter(|(_, expected, actual)| expected != actual)
            .map(|(check, expected, actual)| {
                warn!(page_id, check, expected, actual, "Example count mismatch");
                Issue::count_mismatch(page_id, check, expected, actual)
            })
            .collect()
    }
}

/// A non-fatal problem found while reconciling, reported at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub page_id: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueKind {
    CountMismatch {
        check: String,
        expected: usize,
        actual: usize,
    },
    ClassifierFailure {
        line: usize,
        message: String,
    },
    PageFailed {
        message: String,
    },
    /// `page_id` holds the project name.
    ProjectFailed {
        message: String,
    },
}

impl Issue {
    pub fn count_mismatch(page_id: &str, check: &str, expected: usize, actual: usize) -> Self {
        Self {
            page_id: page_id.to_string(),
            kind: IssueKind::CountMismatch {
                check: check.to_string(),
                expected,
                actual,
            },
        }
    }

    pub fn classifier_failure(page_id: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            page_id: page_id.to_string(),
            kind: IssueKind::ClassifierFailure {
                line,
                message: message.into(),
            },
        }
    }

    pub fn page_failed(page_id: &str, message: impl Into<String>) -> Self {
        Self {
            page_id: page_id.to_string(),
            kind: IssueKind::PageFailed {
                message: message.into(),
            },
        }
    }

    pub fn project_failed(project: &str, message: impl Into<String>) -> Self {
        Self {
            page_id: project.to_string(),
            kind: IssueKind::ProjectFailed {
                message: message.into(),
            },
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::CountMismatch {
                check,
                expected,
                actual,
            } => write!(
                f,
                "Page ID: {}, count check `{}` failed: expected {}, got {}",
                self.page_id, check, expected, actual
            ),
            IssueKind::ClassifierFailure { line, message } => write!(
                f,
                "Page ID: {}, example at line {} left uncategorized: {}",
                self.page_id, line, message
            ),
            IssueKind::PageFailed { message } => {
                write!(f, "Page ID: {}, page not reconciled: {}", self.page_id, message)
            }
            IssueKind::ProjectFailed { message } => {
                write!(f, "Project {}: not reconciled: {}", self.page_id, message)
            }
        }
    }
}
