// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{AuditError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub reconcile: ReconcileConfig,
    pub pipeline: PipelineConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Directory holding one sub-directory of page AST documents per project.
    pub ast_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

/// Knobs for the reconciliation heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Maximum edit distance, as a percentage of the stored example's length,
    /// for an incoming example to count as an update instead of a new example.
    pub similarity_threshold_percent: f64,
    /// A new usage example longer than this many characters is reported as an
    /// applied usage example.
    pub applied_usage_min_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub page_workers: usize,
    pub project_workers: usize,
    /// Cap on in-flight fallback classifier calls, independent of the page pool.
    pub classifier_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    pub llm_enabled: bool,
    pub ollama_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    /// Projects documenting the drivers. Their JavaScript and text examples
    /// get the driver-language prompt.
    #[serde(default)]
    pub driver_projects: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            similarity_threshold_percent: 50.0,
            applied_usage_min_chars: 300,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("EXAMPLE_AUDIT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| AuditError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| AuditError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            source: SourceConfig {
                ast_dir: PathBuf::from("./data/ast"),
            },
            store: StoreConfig {
                data_dir: PathBuf::from("./data/store"),
            },
            reconcile: ReconcileConfig::default(),
            pipeline: PipelineConfig {
                page_workers: 8,
                project_workers: 2,
                classifier_concurrency: 2,
            },
            classifier: ClassifierConfig {
                llm_enabled: false,
                ollama_url: "http://localhost:11434".to_string(),
                model: "qwen2.5-coder".to_string(),
                request_timeout_secs: 60,
                driver_projects: Vec::new(),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.page_workers == 0 {
            return Err(AuditError::Config(
                "page_workers must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.project_workers == 0 {
            return Err(AuditError::Config(
                "project_workers must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.classifier_concurrency == 0 {
            return Err(AuditError::Config(
                "classifier_concurrency must be greater than 0".to_string(),
            ));
        }

        let threshold = self.reconcile.similarity_threshold_percent;
        if !(threshold > 0.0 && threshold <= 100.0) {
            return Err(AuditError::Config(format!(
                "similarity_threshold_percent must be in (0, 100], got {}",
                threshold
            )));
        }

        Ok(())
    }
}
