// file: src/store/mod.rs
// description: persistence abstraction for per-page code example lists
// reference: internal module structure

pub mod json_file;
pub mod memory;

use crate::error::Result;
use crate::models::StoredExample;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

/// Everything persisted for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_id: String,
    pub project: String,
    pub examples: Vec<StoredExample>,
    pub date_last_updated: DateTime<Utc>,
}

/// Page-keyed example storage.
///
/// Examples have no identity of their own, so a page's list is only ever
/// replaced as a whole. A missing page is `Ok(None)`, not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExampleStore: Send + Sync {
    async fn get(&self, project: &str, page_id: &str) -> Result<Option<Vec<StoredExample>>>;

    async fn replace(&self, project: &str, page_id: &str, examples: Vec<StoredExample>)
    -> Result<()>;

    /// Returns whether the page existed.
    async fn delete(&self, project: &str, page_id: &str) -> Result<bool>;

    /// Page ids stored for a project, sorted.
    async fn list_pages(&self, project: &str) -> Result<Vec<String>>;
}
