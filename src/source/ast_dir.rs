// file: src/source/ast_dir.rs
// description: reads page AST documents from a directory tree
// reference: https://docs.rs/walkdir

use crate::error::{AuditError, Result};
use crate::models::PageDocument;
use crate::source::{ExampleSource, IncomingPage, ProjectPages, store_page_id};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Expects `<root>/<project>/**/*.json`, one [`PageDocument`] per file.
pub struct AstDirectorySource {
    root: PathBuf,
}

impl AstDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn scan_project(root: &Path, project: &str) -> Result<ProjectPages> {
        let project_dir = root.join(project);
        if !project_dir.is_dir() {
            return Err(AuditError::Source(format!(
                "Project directory not found: {}",
                project_dir.display()
            )));
        }

        info!("Scanning pages in {}", project_dir.display());
        let mut result = ProjectPages::default();
        let mut files: Vec<PathBuf> = Vec::new();

        // Anything the walk cannot account for makes the fetch incomplete, so
        // the driver never treats an unseen page as deleted.
        for entry in WalkDir::new(&project_dir).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let location = e
                        .path()
                        .map(|path| relative_location(root, path))
                        .unwrap_or_else(|| project.to_string());
                    warn!("Cannot walk {}: {}", location, e);
                    result.unreadable.push((location, e.to_string()));
                    continue;
                }
            };

            let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
            if !is_json || entry.file_type().is_dir() {
                continue;
            }
            if !entry.file_type().is_file() {
                let location = relative_location(root, entry.path());
                warn!("Page document {} is not a regular file", location);
                result
                    .unreadable
                    .push((location, "not a regular file".to_string()));
                continue;
            }
            files.push(entry.into_path());
        }
        files.sort();

        let mut seen = HashSet::new();

        for path in files {
            let relative = relative_location(root, &path);

            let document = match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|contents| {
                    serde_json::from_str::<PageDocument>(&contents).map_err(|e| e.to_string())
                }) {
                Ok(document) => document,
                Err(e) => {
                    warn!("Unreadable page document {}: {}", relative, e);
                    result.unreadable.push((relative, e));
                    continue;
                }
            };

            let page_id = store_page_id(&document.page_id);
            if !seen.insert(page_id.clone()) {
                warn!("Duplicate page id {} in {}, keeping the first", page_id, relative);
                continue;
            }

            let examples = document.ast.code_examples();
            debug!("Page {} has {} code examples", page_id, examples.len());
            result.pages.push(IncomingPage {
                page_id,
                deleted: document.deleted,
                examples,
            });
        }

        info!(
            "Found {} pages ({} unreadable) for {}",
            result.pages.len(),
            result.unreadable.len(),
            project
        );
        Ok(result)
    }
}

fn relative_location(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

#[async_trait]
impl ExampleSource for AstDirectorySource {
    async fn list_projects(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| AuditError::FileOperation {
            path: self.root.clone(),
            source: e,
        })?;

        let mut projects: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        projects.sort();
        Ok(projects)
    }

    async fn fetch_project(&self, project: &str) -> Result<ProjectPages> {
        let root = self.root.clone();
        let project = project.to_string();
        tokio::task::spawn_blocking(move || Self::scan_project(&root, &project))
            .await
            .map_err(|e| AuditError::Source(format!("Page scan task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_page(dir: &Path, relative: &str, body: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_page(
            dir.path(),
            "node/crud/insert.json",
            r#"{"page_id": "node/crud/insert", "ast": {"type": "root", "children": [
                {"type": "code", "lang": "javascript", "value": "await coll.insertOne(doc);"},
                {"type": "section", "children": [
                    {"type": "code", "lang": "console", "value": "npm install mongodb"}
                ]}
            ]}}"#,
        );
        write_page(
            dir.path(),
            "node/old.json",
            r#"{"page_id": "node/old", "deleted": true, "ast": {"type": "root"}}"#,
        );
        write_page(dir.path(), "node/notes.txt", "ignored");
        write_page(dir.path(), "python/index.json", r#"{"page_id": "python/index", "ast": {"type": "root"}}"#);
        dir
    }

    #[tokio::test]
    async fn test_lists_projects() {
        let dir = sample_tree();
        let source = AstDirectorySource::new(dir.path());
        assert_eq!(source.list_projects().await.unwrap(), vec!["node", "python"]);
    }

    #[tokio::test]
    async fn test_fetches_pages_with_examples() {
        let dir = sample_tree();
        let source = AstDirectorySource::new(dir.path());

        let fetched = source.fetch_project("node").await.unwrap();

        assert!(fetched.is_complete());
        assert_eq!(fetched.pages.len(), 2);
        let insert = fetched
            .pages
            .iter()
            .find(|p| p.page_id == "node|crud|insert")
            .unwrap();
        assert_eq!(insert.examples.len(), 2);
        assert_eq!(insert.examples[1].lang, "console");

        let old = fetched.pages.iter().find(|p| p.page_id == "node|old").unwrap();
        assert!(old.deleted);
    }

    #[tokio::test]
    async fn test_unreadable_documents_are_reported() {
        let dir = sample_tree();
        write_page(dir.path(), "node/broken.json", "{ nope");
        let source = AstDirectorySource::new(dir.path());

        let fetched = source.fetch_project("node").await.unwrap();

        assert!(!fetched.is_complete());
        assert_eq!(fetched.unreadable.len(), 1);
        assert!(fetched.unreadable[0].0.ends_with("broken.json"));
        assert_eq!(fetched.pages.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_page_documents_are_read() {
        let dir = sample_tree();
        let outside = TempDir::new().unwrap();
        write_page(
            outside.path(),
            "linked.json",
            r#"{"page_id": "node/linked", "ast": {"type": "root", "children": [
                {"type": "code", "lang": "python", "value": "import pymongo"}
            ]}}"#,
        );
        std::os::unix::fs::symlink(
            outside.path().join("linked.json"),
            dir.path().join("node/linked.json"),
        )
        .unwrap();
        let source = AstDirectorySource::new(dir.path());

        let fetched = source.fetch_project("node").await.unwrap();

        assert!(fetched.is_complete());
        let linked = fetched
            .pages
            .iter()
            .find(|p| p.page_id == "node|linked")
            .unwrap();
        assert_eq!(linked.examples.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_link_makes_fetch_incomplete() {
        let dir = sample_tree();
        std::os::unix::fs::symlink(
            dir.path().join("missing/target.json"),
            dir.path().join("node/dangling.json"),
        )
        .unwrap();
        let source = AstDirectorySource::new(dir.path());

        let fetched = source.fetch_project("node").await.unwrap();

        assert!(!fetched.is_complete());
        assert_eq!(fetched.unreadable.len(), 1);
        assert!(fetched.unreadable[0].0.ends_with("dangling.json"));
        assert_eq!(fetched.pages.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_project_is_source_error() {
        let dir = sample_tree();
        let source = AstDirectorySource::new(dir.path());
        let result = source.fetch_project("rust").await;
        assert!(matches!(result, Err(AuditError::Source(_))));
    }
}
