// file: src/report/json.rs
// description: writes run reports as json files

use crate::error::{AuditError, Result};
use crate::report::project::RunReport;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    output_dir: PathBuf,
}

impl JsonReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| AuditError::FileOperation {
            path: output_dir.clone(),
            source: e,
        })?;
        Ok(Self { output_dir })
    }

    /// Writes `run-<run_id>.json` and returns its path.
    pub fn write(&self, report: &RunReport) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("run-{}.json", report.run_id));
        let contents = serde_json::to_string_pretty(report)?;
        fs::write(&path, contents).map_err(|e| AuditError::FileOperation {
            path: path.clone(),
            source: e,
        })?;

        info!(
            "Wrote report for {} projects to {}",
            report.projects.len(),
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::Issue;
    use crate::report::project::{Change, ProjectReport};
    use tempfile::tempdir;

    #[test]
    fn test_writer_creates_directory() {
        let dir = tempdir().unwrap();
        let writer = JsonReportWriter::new(dir.path().join("reports"));
        assert!(writer.is_ok());
        assert!(dir.path().join("reports").is_dir());
    }

    #[test]
    fn test_report_written_and_readable() {
        let dir = tempdir().unwrap();
        let writer = JsonReportWriter::new(dir.path()).unwrap();

        let mut report = RunReport::start();
        let mut project = ProjectReport::new("node");
        project.changes.push(Change::PageRemoved {
            page_id: "node|old".to_string(),
        });
        project
            .issues
            .push(Issue::count_mismatch("node|a", "unchanged + updated + new == incoming", 3, 2));
        report.projects.push(project);
        report.finish();

        let path = writer.write(&report).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            format!("run-{}.json", report.run_id)
        );

        let contents = fs::read_to_string(&path).unwrap();
        let back: RunReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(back, report);

        let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(json["projects"][0]["issues"][0]["expected"], 3);
        assert_eq!(json["projects"][0]["changes"][0]["type"], "page_removed");
    }
}
