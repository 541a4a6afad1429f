// file: src/models/ast.rs
// description: typed AST nodes for documentation pages and code example extraction
// reference: https://github.com/mongodb/snooty-parser

use crate::models::example::IncomingExample;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLine {
    #[serde(default)]
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub start: PositionLine,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

/// One page as delivered by the documentation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDocument {
    pub page_id: String,
    #[serde(default)]
    pub deleted: bool,
    pub ast: AstNode,
}

impl AstNode {
    pub const CODE: &'static str = "code";

    pub fn code(value: &str, lang: &str, line: usize) -> Self {
        Self {
            node_type: Self::CODE.to_string(),
            position: Position {
                start: PositionLine { line },
            },
            value: Some(value.to_string()),
            lang: Some(lang.to_string()),
            ..Self::default()
        }
    }

    pub fn parent(node_type: &str, children: Vec<AstNode>) -> Self {
        Self {
            node_type: node_type.to_string(),
            children,
            ..Self::default()
        }
    }

    /// Collects every `code` node depth-first, in document order.
    pub fn code_examples(&self) -> Vec<IncomingExample> {
        let mut found = Vec::new();
        self.collect_code(&mut found);
        found
    }

    fn collect_code(&self, found: &mut Vec<IncomingExample>) {
        if self.node_type == Self::CODE {
            found.push(
                IncomingExample::new(
                    self.value.clone().unwrap_or_default(),
                    self.lang.clone().unwrap_or_default(),
                )
                .at_line(self.position.start.line),
            );
        }
        for child in &self.children {
            child.collect_code(found);
        }
    }
}
