// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store operation failed for page {page_id}: {message}")]
    Store { page_id: String, message: String },

    #[error("Source error: {0}")]
    Source(String),

    #[error("Category classification failed: {0}")]
    Classifier(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuditError {
    pub fn store(page_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            page_id: page_id.into(),
            message: message.into(),
        }
    }
}
