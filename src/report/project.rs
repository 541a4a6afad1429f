// file: src/report/project.rs
// description: per-project and per-run audit reports built from page outcomes
// reference: internal reporting structures

use crate::reconcile::{Issue, PageReconciliation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One auditable change, phrased for the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    PageCreated { page_id: String },
    PageUpdated { page_id: String },
    PageRemoved { page_id: String },
    CodeExampleCreated { page_id: String, count: usize },
    CodeExampleUpdated { page_id: String, count: usize },
    CodeExampleRemoved { page_id: String, count: usize },
    CodeNodeCountChange { page_id: String, was: usize, now: usize },
    AppliedUsageExampleAdded { page_id: String, count: usize },
    ProjectSummaryCodeNodeCountChange { project: String, was: usize, now: usize },
    ProjectSummaryPageCountChange { project: String, was: usize, now: usize },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::PageCreated { page_id } => write!(f, "Page ID: {} created", page_id),
            Change::PageUpdated { page_id } => write!(f, "Page ID: {} updated", page_id),
            Change::PageRemoved { page_id } => write!(f, "Page ID: {} removed", page_id),
            Change::CodeExampleCreated { page_id, count } => {
                write!(f, "Page ID: {}, {} new code examples added", page_id, count)
            }
            Change::CodeExampleUpdated { page_id, count } => {
                write!(f, "Page ID: {}, {} code examples updated", page_id, count)
            }
            Change::CodeExampleRemoved { page_id, count } => {
                write!(f, "Page ID: {}, {} code examples removed", page_id, count)
            }
            Change::CodeNodeCountChange { page_id, was, now } => write!(
                f,
                "Page ID: {}, code node count was: {}, now {}",
                page_id, was, now
            ),
            Change::AppliedUsageExampleAdded { page_id, count } => write!(
                f,
                "Page ID: {}, {} new applied usage examples added",
                page_id, count
            ),
            Change::ProjectSummaryCodeNodeCountChange { project, was, now } => write!(
                f,
                "Project {}: code node count from summary was {}, now {}",
                project, was, now
            ),
            Change::ProjectSummaryPageCountChange { project, was, now } => write!(
                f,
                "Project {}: page count from summary was {}, now {}",
                project, was, now
            ),
        }
    }
}

/// What happened to a single page during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Reconciled {
        reconciliation: PageReconciliation,
        /// The store had no record of the page before this run.
        created: bool,
        /// The store was rewritten. False when nothing changed.
        written: bool,
    },
    Removed {
        page_id: String,
        active_examples: usize,
    },
    Failed {
        page_id: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCounters {
    pub pages_before: usize,
    pub pages_after: usize,
    pub pages_created: usize,
    pub pages_updated: usize,
    pub pages_unchanged: usize,
    pub pages_removed: usize,
    pub pages_failed: usize,
    /// Active examples before the run, on pages that were processed.
    pub examples_before: usize,
    /// Active examples after the run, on pages that were processed.
    pub examples_after: usize,
    pub examples_unchanged: usize,
    pub examples_updated: usize,
    pub examples_new: usize,
    pub examples_removed: usize,
    pub applied_usage_added: usize,
}

impl ProjectCounters {
    pub fn merge(&mut self, other: &ProjectCounters) {
        self.pages_before += other.pages_before;
        self.pages_after += other.pages_after;
        self.pages_created += other.pages_created;
        self.pages_updated += other.pages_updated;
        self.pages_unchanged += other.pages_unchanged;
        self.pages_removed += other.pages_removed;
        self.pages_failed += other.pages_failed;
        self.examples_before += other.examples_before;
        self.examples_after += other.examples_after;
        self.examples_unchanged += other.examples_unchanged;
        self.examples_updated += other.examples_updated;
        self.examples_new += other.examples_new;
        self.examples_removed += other.examples_removed;
        self.applied_usage_added += other.applied_usage_added;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub project: String,
    pub counters: ProjectCounters,
    pub changes: Vec<Change>,
    pub issues: Vec<Issue>,
}

impl ProjectReport {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Reconciled {
                reconciliation,
                created,
                written,
            } => self.record_reconciled(reconciliation, created, written),
            PageOutcome::Removed {
                page_id,
                active_examples,
            } => {
                self.counters.pages_removed += 1;
                self.counters.examples_before += active_examples;
                self.counters.examples_removed += active_examples;
                if active_examples > 0 {
                    self.changes.push(Change::CodeExampleRemoved {
                        page_id: page_id.clone(),
                        count: active_examples,
                    });
                }
                self.changes.push(Change::PageRemoved { page_id });
            }
            PageOutcome::Failed { page_id, message } => {
                self.counters.pages_failed += 1;
                self.issues.push(Issue::page_failed(&page_id, message));
            }
        }
    }

    fn record_reconciled(&mut self, page: PageReconciliation, created: bool, written: bool) {
        let counters = page.counters;
        let page_id = page.page_id;

        self.counters.examples_before += counters.existing;
        self.counters.examples_after += counters.incoming;
        self.counters.examples_unchanged += counters.unchanged;
        self.counters.examples_updated += counters.updated;
        self.counters.examples_new += counters.new;
        self.counters.examples_removed += counters.removed;
        self.counters.applied_usage_added += counters.new_applied_usage;

        if created {
            self.counters.pages_created += 1;
            self.changes.push(Change::PageCreated {
                page_id: page_id.clone(),
            });
        } else if written {
            self.counters.pages_updated += 1;
            self.changes.push(Change::PageUpdated {
                page_id: page_id.clone(),
            });
        } else {
            self.counters.pages_unchanged += 1;
        }

        if counters.new > 0 {
            self.changes.push(Change::CodeExampleCreated {
                page_id: page_id.clone(),
                count: counters.new,
            });
        }
        if counters.updated > 0 {
            self.changes.push(Change::CodeExampleUpdated {
                page_id: page_id.clone(),
                count: counters.updated,
            });
        }
        if counters.removed > 0 {
            self.changes.push(Change::CodeExampleRemoved {
                page_id: page_id.clone(),
                count: counters.removed,
            });
        }
        if !created && counters.existing != counters.incoming {
            self.changes.push(Change::CodeNodeCountChange {
                page_id: page_id.clone(),
                was: counters.existing,
                now: counters.incoming,
            });
        }
        if counters.new_applied_usage > 0 {
            self.changes.push(Change::AppliedUsageExampleAdded {
                page_id,
                count: counters.new_applied_usage,
            });
        }

        self.issues.extend(page.issues);
    }

    /// Records project-wide totals and the summary changes they imply.
    pub fn summarize(&mut self, pages_before: usize, pages_after: usize) {
        self.counters.pages_before = pages_before;
        self.counters.pages_after = pages_after;

        if self.counters.examples_before != self.counters.examples_after {
            self.changes.push(Change::ProjectSummaryCodeNodeCountChange {
                project: self.project.clone(),
                was: self.counters.examples_before,
                now: self.counters.examples_after,
            });
        }
        if pages_before != pages_after {
            self.changes.push(Change::ProjectSummaryPageCountChange {
                project: self.project.clone(),
                was: pages_before,
                now: pages_after,
            });
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub projects: Vec<ProjectReport>,
}

impl RunReport {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            projects: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn totals(&self) -> ProjectCounters {
        let mut totals = ProjectCounters::default();
        for project in &self.projects {
            totals.merge(&project.counters);
        }
        totals
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.projects.iter().flat_map(|project| project.issues.iter())
    }

    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.projects.iter().flat_map(|project| project.changes.iter())
    }
}
