// file: src/pipeline/driver.rs
// description: coordinates source pages, stored examples, reconciliation, and writes
// reference: orchestrates asynchronous per-page reconciliation with bounded workers

use crate::classifier::CategoryClassifier;
use crate::config::{Config, ReconcileConfig};
use crate::error::Result;
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::reconcile::{Issue, reconcile_page};
use crate::report::{PageOutcome, ProjectReport, RunReport};
use crate::source::{ExampleSource, IncomingPage};
use crate::store::ExampleStore;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Active and removed example counts for one stored page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub page_id: String,
    pub active: usize,
    pub removed: usize,
}

enum PageWork {
    Incoming(IncomingPage),
    /// Stored, but no longer delivered by the source.
    Vanished(String),
}

pub struct ReconciliationDriver {
    source: Arc<dyn ExampleSource>,
    store: Arc<dyn ExampleStore>,
    classifier: Arc<dyn CategoryClassifier>,
    reconcile: ReconcileConfig,
    driver_projects: HashSet<String>,
    page_workers: usize,
    project_workers: usize,
    progress: Arc<ProgressTracker>,
}

impl ReconciliationDriver {
    pub fn new(
        config: &Config,
        source: Arc<dyn ExampleSource>,
        store: Arc<dyn ExampleStore>,
        classifier: Arc<dyn CategoryClassifier>,
    ) -> Self {
        Self {
            source,
            store,
            classifier,
            reconcile: config.reconcile.clone(),
            driver_projects: config.classifier.driver_projects.iter().cloned().collect(),
            page_workers: config.pipeline.page_workers.max(1),
            project_workers: config.pipeline.project_workers.max(1),
            progress: Arc::new(ProgressTracker::hidden()),
        }
    }

    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    pub fn stats(&self) -> PipelineStats {
        self.progress.get_stats()
    }

    /// Reconciles the given projects, or every project the source knows
    /// when `projects` is empty. Page and project failures end up in the
    /// report; only failing to list projects is an error.
    pub async fn run(&self, projects: &[String]) -> Result<RunReport> {
        let mut report = RunReport::start();
        info!(run_id = %report.run_id, "Starting reconciliation run");

        let projects = if projects.is_empty() {
            self.source.list_projects().await?
        } else {
            projects.to_vec()
        };

        if projects.is_empty() {
            warn!("No projects found to reconcile");
        }

        let mut reports: Vec<ProjectReport> = stream::iter(projects)
            .map(|project| async move { self.run_project(&project).await })
            .buffer_unordered(self.project_workers)
            .collect()
            .await;
        reports.sort_by(|a, b| a.project.cmp(&b.project));

        report.projects = reports;
        report.finish();
        self.progress.finish();
        self.log_final_stats(&report);

        Ok(report)
    }

    pub async fn run_project(&self, project: &str) -> ProjectReport {
        let mut report = ProjectReport::new(project);

        let mut fetched = match self.source.fetch_project(project).await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(project, "Failed to fetch pages: {}", e);
                report.issues.push(Issue::project_failed(project, e.to_string()));
                return report;
            }
        };

        // One worker per page id, so a page is never written twice in a run.
        let mut seen = HashSet::new();
        fetched.pages.retain(|page| {
            let first = seen.insert(page.page_id.clone());
            if !first {
                warn!(project, page_id = %page.page_id, "Duplicate page from source, keeping the first");
                report.issues.push(Issue::page_failed(
                    &page.page_id,
                    "duplicate page id from source, later copy ignored",
                ));
            }
            first
        });

        for (location, reason) in &fetched.unreadable {
            report
                .issues
                .push(Issue::page_failed(location, format!("unreadable source document: {}", reason)));
        }

        let stored_before = match self.store.list_pages(project).await {
            Ok(pages) => Some(pages),
            Err(e) => {
                warn!(project, "Failed to list stored pages: {}", e);
                None
            }
        };

        let incoming_ids: HashSet<&str> = fetched.pages.iter().map(|p| p.page_id.as_str()).collect();
        // Only a complete fetch proves that a stored page is gone.
        let vanished: Vec<String> = match (&stored_before, fetched.is_complete()) {
            (Some(stored), true) => stored
                .iter()
                .filter(|page_id| !incoming_ids.contains(page_id.as_str()))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };

        info!(
            project,
            incoming = fetched.pages.len(),
            vanished = vanished.len(),
            "Reconciling project"
        );
        self.progress.add_pages(fetched.pages.len() + vanished.len());

        let work = fetched
            .pages
            .into_iter()
            .map(PageWork::Incoming)
            .chain(vanished.into_iter().map(PageWork::Vanished));

        let mut outcomes: Vec<PageOutcome> = stream::iter(work)
            .map(|item| async move {
                match item {
                    PageWork::Incoming(page) if page.deleted => {
                        self.remove_page(project, &page.page_id).await
                    }
                    PageWork::Incoming(page) => {
                        Some(self.reconcile_incoming_page(project, page).await)
                    }
                    PageWork::Vanished(page_id) => self.remove_page(project, &page_id).await,
                }
            })
            .buffer_unordered(self.page_workers)
            .filter_map(|outcome| async move { outcome })
            .collect()
            .await;
        outcomes.sort_by(|a, b| outcome_page_id(a).cmp(outcome_page_id(b)));

        for outcome in outcomes {
            report.record(outcome);
        }

        let pages_before = stored_before.as_ref().map_or(0, Vec::len);
        let pages_after = match self.store.list_pages(project).await {
            Ok(pages) => pages.len(),
            Err(_) => {
                (pages_before + report.counters.pages_created)
                    .saturating_sub(report.counters.pages_removed)
            }
        };
        report.summarize(pages_before, pages_after);

        info!(
            project,
            created = report.counters.pages_created,
            updated = report.counters.pages_updated,
            removed = report.counters.pages_removed,
            failed = report.counters.pages_failed,
            issues = report.issues.len(),
            "Project reconciled"
        );
        report
    }

    async fn reconcile_incoming_page(&self, project: &str, page: IncomingPage) -> PageOutcome {
        let page_id = page.page_id;
        self.progress.set_message(format!("Reconciling {}", page_id));

        let stored = match self.store.get(project, &page_id).await {
            Ok(stored) => stored,
            Err(e) => return self.fail(page_id, e.to_string()),
        };
        let created = stored.is_none();
        let previous = stored.unwrap_or_default();

        let reconciliation = reconcile_page(
            &page_id,
            previous.clone(),
            page.examples,
            self.classifier.as_ref(),
            &self.reconcile,
            self.driver_projects.contains(project),
            Utc::now(),
        )
        .await;

        let written = created || reconciliation.examples != previous;
        if written {
            if let Err(e) = self
                .store
                .replace(project, &page_id, reconciliation.examples.clone())
                .await
            {
                return self.fail(page_id, e.to_string());
            }
        }

        self.progress
            .inc_pages_processed(reconciliation.counters.incoming);
        PageOutcome::Reconciled {
            reconciliation,
            created,
            written,
        }
    }

    /// Deletes a page from the store. `None` when there was nothing to delete.
    async fn remove_page(&self, project: &str, page_id: &str) -> Option<PageOutcome> {
        let stored = match self.store.get(project, page_id).await {
            Ok(stored) => stored,
            Err(e) => return Some(self.fail(page_id.to_string(), e.to_string())),
        };

        let Some(examples) = stored else {
            self.progress.inc_pages_processed(0);
            return None;
        };

        if let Err(e) = self.store.delete(project, page_id).await {
            return Some(self.fail(page_id.to_string(), e.to_string()));
        }

        info!(page_id, "Removed page");
        self.progress.inc_pages_processed(0);
        Some(PageOutcome::Removed {
            page_id: page_id.to_string(),
            active_examples: examples.iter().filter(|e| !e.is_removed()).count(),
        })
    }

    fn fail(&self, page_id: String, message: String) -> PageOutcome {
        warn!(page_id = %page_id, "Page failed: {}", message);
        self.progress.inc_pages_failed();
        PageOutcome::Failed { page_id, message }
    }

    /// Active and removed counts for every stored page of a project.
    pub async fn page_stats(&self, project: &str) -> Result<Vec<PageStats>> {
        let mut stats = Vec::new();
        for page_id in self.store.list_pages(project).await? {
            let examples = self.store.get(project, &page_id).await?.unwrap_or_default();
            let removed = examples.iter().filter(|e| e.is_removed()).count();
            stats.push(PageStats {
                page_id,
                active: examples.len() - removed,
                removed,
            });
        }
        Ok(stats)
    }

    fn log_final_stats(&self, report: &RunReport) {
        let stats = self.progress.get_stats();
        let totals = report.totals();

        info!("=== Reconciliation Summary ===");
        info!("Run ID: {}", report.run_id);
        info!("Duration: {} seconds", stats.duration_secs);
        info!("Pages processed: {}", stats.pages_processed);
        info!("Pages failed: {}", stats.pages_failed);
        info!("Success rate: {:.2}%", stats.success_rate());
        info!(
            "Pages created/updated/unchanged/removed: {}/{}/{}/{}",
            totals.pages_created, totals.pages_updated, totals.pages_unchanged, totals.pages_removed
        );
        info!(
            "Examples unchanged/updated/new/removed: {}/{}/{}/{}",
            totals.examples_unchanged,
            totals.examples_updated,
            totals.examples_new,
            totals.examples_removed
        );
        info!("Applied usage examples added: {}", totals.applied_usage_added);
        info!("Issues: {}", report.issues().count());
        info!("Processing speed: {:.2} pages/sec", stats.pages_per_second());
        info!("==============================");
    }
}

fn outcome_page_id(outcome: &PageOutcome) -> &str {
    match outcome {
        PageOutcome::Reconciled { reconciliation, .. } => &reconciliation.page_id,
        PageOutcome::Removed { page_id, .. } | PageOutcome::Failed { page_id, .. } => page_id,
    }
}
