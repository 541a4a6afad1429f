// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod ast;
pub mod category;
pub mod example;
pub mod language;

pub use ast::{AstNode, PageDocument};
pub use category::Category;
pub use example::{ExampleStatus, IncomingExample, StoredExample, split_current_removed};
