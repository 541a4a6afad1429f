// file: src/source/mod.rs
// description: sources of incoming documentation pages and their code examples
// reference: internal module structure

pub mod ast_dir;

use crate::error::Result;
use crate::models::IncomingExample;
use async_trait::async_trait;

pub use ast_dir::AstDirectorySource;

/// One page as the source currently sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingPage {
    /// Store page id, see [`store_page_id`].
    pub page_id: String,
    pub deleted: bool,
    /// Code examples in document order, stable within one fetch.
    pub examples: Vec<IncomingExample>,
}

/// Every page fetched for a project, plus anything that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPages {
    pub pages: Vec<IncomingPage>,
    /// Locations that could not be parsed, with the reason.
    pub unreadable: Vec<(String, String)>,
}

impl ProjectPages {
    /// True when every page of the project was read, so a stored page absent
    /// from `pages` really is gone from the source.
    pub fn is_complete(&self) -> bool {
        self.unreadable.is_empty()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExampleSource: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<String>>;

    async fn fetch_project(&self, project: &str) -> Result<ProjectPages>;
}

/// Source page ids are paths. Stored page ids use `|` in place of `/`.
pub fn store_page_id(source_page_id: &str) -> String {
    source_page_id.replace('/', "|")
}
