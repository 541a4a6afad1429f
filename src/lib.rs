// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns

pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod source;
pub mod store;
pub mod utils;

pub use classifier::{CategoryClassifier, CategoryOutcome, LayeredClassifier, OllamaClassifier};
pub use config::{
    ClassifierConfig, Config, PipelineConfig, ReconcileConfig, SourceConfig, StoreConfig,
};
pub use error::{AuditError, Result};
pub use models::{Category, IncomingExample, StoredExample};
pub use pipeline::{PageStats, PipelineStats, ProgressTracker, ReconciliationDriver};
pub use reconcile::{Issue, PageReconciliation, ReconciliationCounters, reconcile_page};
pub use report::{Change, JsonReportWriter, ProjectReport, RunReport};
pub use source::{AstDirectorySource, ExampleSource};
pub use store::{ExampleStore, InMemoryStore, JsonFileStore};
