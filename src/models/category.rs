// file: src/models/category.rs
// description: code example classification categories

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Syntax example")]
    SyntaxExample,
    #[serde(rename = "Non-MongoDB command")]
    NonMongoCommand,
    #[serde(rename = "Example return object")]
    ExampleReturnObject,
    #[serde(rename = "Example configuration object")]
    ExampleConfigurationObject,
    #[serde(rename = "Usage example")]
    UsageExample,
    /// Sentinel for examples no classifier could place.
    #[serde(rename = "Uncategorized")]
    Uncategorized,
}

impl Category {
    pub const ASSIGNABLE: [Category; 5] = [
        Category::SyntaxExample,
        Category::NonMongoCommand,
        Category::ExampleReturnObject,
        Category::ExampleConfigurationObject,
        Category::UsageExample,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SyntaxExample => "Syntax example",
            Category::NonMongoCommand => "Non-MongoDB command",
            Category::ExampleReturnObject => "Example return object",
            Category::ExampleConfigurationObject => "Example configuration object",
            Category::UsageExample => "Usage example",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Maps free-form text (for example an LLM completion) to a category.
    pub fn parse_loose(text: &str) -> Category {
        let cleaned = text.trim().trim_matches(|c: char| c == '"' || c == '.' || c == '\'');
        Self::ASSIGNABLE
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(cleaned))
            .unwrap_or(Category::Uncategorized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
