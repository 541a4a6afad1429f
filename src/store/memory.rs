// file: src/store/memory.rs
// description: in-memory example store for tests and dry runs
// reference: internal module structure

use crate::error::{AuditError, Result};
use crate::models::StoredExample;
use crate::store::{ExampleStore, PageRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

/// Pages keyed by `(project, page_id)` behind a `RwLock`.
#[derive(Default)]
pub struct InMemoryStore {
    pages: RwLock<HashMap<(String, String), PageRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, project: &str, page_id: &str) -> Option<PageRecord> {
        self.pages
            .read()
            .ok()?
            .get(&(project.to_string(), page_id.to_string()))
            .cloned()
    }
}

fn poisoned(page_id: &str) -> AuditError {
    AuditError::store(page_id, "in-memory store lock poisoned")
}

#[async_trait]
impl ExampleStore for InMemoryStore {
    async fn get(&self, project: &str, page_id: &str) -> Result<Option<Vec<StoredExample>>> {
        let pages = self.pages.read().map_err(|_| poisoned(page_id))?;
        Ok(pages
            .get(&(project.to_string(), page_id.to_string()))
            .map(|record| record.examples.clone()))
    }

    async fn replace(
        &self,
        project: &str,
        page_id: &str,
        examples: Vec<StoredExample>,
    ) -> Result<()> {
        let mut pages = self.pages.write().map_err(|_| poisoned(page_id))?;
        pages.insert(
            (project.to_string(), page_id.to_string()),
            PageRecord {
                page_id: page_id.to_string(),
                project: project.to_string(),
                examples,
                date_last_updated: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, project: &str, page_id: &str) -> Result<bool> {
        let mut pages = self.pages.write().map_err(|_| poisoned(page_id))?;
        Ok(pages
            .remove(&(project.to_string(), page_id.to_string()))
            .is_some())
    }

    async fn list_pages(&self, project: &str) -> Result<Vec<String>> {
        let pages = self.pages.read().map_err(|_| poisoned(project))?;
        let mut ids: Vec<String> = pages
            .keys()
            .filter(|(p, _)| p == project)
            .map(|(_, page_id)| page_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
