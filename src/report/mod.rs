// file: src/report/mod.rs
// description: run reporting module exports

pub mod json;
pub mod project;

pub use json::JsonReportWriter;
pub use project::{Change, PageOutcome, ProjectCounters, ProjectReport, RunReport};
