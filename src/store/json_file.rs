// file: src/store/json_file.rs
// description: one JSON document per page on local disk with atomic replace
// reference: https://docs.rs/tokio/latest/tokio/fs/index.html

use crate::error::{AuditError, Result};
use crate::models::StoredExample;
use crate::store::{ExampleStore, PageRecord};
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Stores each page at `<root>/<project>/<sha256(page_id)>.json`.
///
/// Writes land in a temporary file that is renamed over the page file, so a
/// reader sees either the old list or the new one, never a partial write.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| AuditError::FileOperation {
                path: root.clone(),
                source: e,
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_dir(&self, project: &str) -> Result<PathBuf> {
        if project.is_empty()
            || project == "."
            || project == ".."
            || project.contains(['/', '\\'])
        {
            return Err(AuditError::Config(format!(
                "Invalid project name for file store: {:?}",
                project
            )));
        }
        Ok(self.root.join(project))
    }

    fn page_path(&self, project: &str, page_id: &str) -> Result<PathBuf> {
        let mut hasher = Sha256::new();
        hasher.update(page_id.as_bytes());
        let file_name = format!("{:x}.json", hasher.finalize());
        Ok(self.project_dir(project)?.join(file_name))
    }

    async fn read_record(&self, path: &Path, page_id: &str) -> Result<Option<PageRecord>> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuditError::store(
                    page_id,
                    format!("Failed to read {}: {}", path.display(), e),
                ));
            }
        };

        let record: PageRecord = serde_json::from_str(&contents).map_err(|e| {
            AuditError::store(page_id, format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(record))
    }
}

#[async_trait]
impl ExampleStore for JsonFileStore {
    async fn get(&self, project: &str, page_id: &str) -> Result<Option<Vec<StoredExample>>> {
        let path = self.page_path(project, page_id)?;
        let record = self.read_record(&path, page_id).await?;
        Ok(record.map(|record| record.examples))
    }

    async fn replace(
        &self,
        project: &str,
        page_id: &str,
        examples: Vec<StoredExample>,
    ) -> Result<()> {
        let dir = self.project_dir(project)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AuditError::FileOperation {
                path: dir.clone(),
                source: e,
            })?;

        let path = self.page_path(project, page_id)?;
        let record = PageRecord {
            page_id: page_id.to_string(),
            project: project.to_string(),
            examples,
            date_last_updated: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&record)?;

        let tmp_path = path.with_extension(format!("json.{}.tmp", Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp_path, contents).await {
            return Err(AuditError::store(
                page_id,
                format!("Failed to write {}: {}", tmp_path.display(), e),
            ));
        }
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                warn!("Failed to remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(AuditError::store(
                page_id,
                format!("Failed to move page file into place: {}", e),
            ));
        }

        debug!(
            "Saved {} examples for {} to {}",
            record.examples.len(),
            page_id,
            path.display()
        );
        Ok(())
    }

    async fn delete(&self, project: &str, page_id: &str) -> Result<bool> {
        let path = self.page_path(project, page_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AuditError::store(
                page_id,
                format!("Failed to delete {}: {}", path.display(), e),
            )),
        }
    }

    async fn list_pages(&self, project: &str) -> Result<Vec<String>> {
        let dir = self.project_dir(project)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AuditError::FileOperation { path: dir, source: e }),
        };

        let mut page_ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path, &path.display().to_string()).await {
                Ok(Some(record)) => page_ids.push(record.page_id),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable page file: {}", e),
            }
        }

        page_ids.sort();
        Ok(page_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ExampleStatus};
    use tempfile::tempdir;

    fn example(code: &str) -> StoredExample {
        StoredExample {
            code: code.to_string(),
            language: "javascript".to_string(),
            file_extension: ".js".to_string(),
            category: Category::UsageExample,
            sha256_hash: crate::reconcile::fingerprint(code),
            llm_categorized: true,
            date_added: Utc::now(),
            date_updated: None,
            instances_on_page: Some(1),
            status: ExampleStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_page_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        let examples = vec![example("db.a.find()"), example("db.b.find()")];

        store
            .replace("node", "node|usage|crud", examples.clone())
            .await
            .unwrap();

        // A fresh store over the same directory sees the write.
        let reopened = JsonFileStore::new(dir.path()).await.unwrap();
        let loaded = reopened.get("node", "node|usage|crud").await.unwrap();
        assert_eq!(loaded, Some(examples));
    }

    #[tokio::test]
    async fn test_missing_page_and_project() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();

        assert_eq!(store.get("node", "node|nope").await.unwrap(), None);
        assert!(store.list_pages("node").await.unwrap().is_empty());
        assert!(!store.delete("node", "node|nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        store.replace("node", "node|b", Vec::new()).await.unwrap();
        store.replace("node", "node|a", Vec::new()).await.unwrap();
        store.replace("other", "other|a", Vec::new()).await.unwrap();

        assert_eq!(
            store.list_pages("node").await.unwrap(),
            vec!["node|a", "node|b"]
        );

        assert!(store.delete("node", "node|a").await.unwrap());
        assert_eq!(store.list_pages("node").await.unwrap(), vec!["node|b"]);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        store
            .replace("node", "node|a", vec![example("x")])
            .await
            .unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path().join("node"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with(".json"));
    }

    #[tokio::test]
    async fn test_corrupt_page_is_store_error() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        store.replace("node", "node|a", Vec::new()).await.unwrap();
        let path = store.page_path("node", "node|a").unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let result = store.get("node", "node|a").await;
        assert!(matches!(result, Err(AuditError::Store { .. })));
    }

    #[tokio::test]
    async fn test_rejects_path_like_project_names() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();
        assert!(store.get("../escape", "p").await.is_err());
    }
}
