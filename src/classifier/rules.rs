// file: src/classifier/rules.rs
// description: prefix and substring heuristics that categorize examples without a model
// reference: https://docs.rs/regex

use crate::models::Category;
use crate::models::language::{
    BASH, C, CPP, CSHARP, GO, JAVA, JAVASCRIPT, JSON, KOTLIN, PHP, PYTHON, RUBY, RUST, SCALA,
    SHELL, SWIFT, TEXT, TYPESCRIPT, UNDEFINED, XML, YAML,
};
use lazy_static::lazy_static;
use regex::Regex;

const SYNTAX_PREFIXES: &[&str] = &["atlas ", "mongosh "];

const USAGE_PREFIXES: &[&str] = &[
    "import ",
    "from ",
    "namespace ",
    "package ",
    "using ",
    "mongodb://",
    "mongodb+srv://",
    "curl ",
];

const NON_MONGO_PREFIXES: &[&str] = &[
    "mkdir ",
    "cd ",
    "touch ",
    "docker ",
    "docker-compose ",
    "brew ",
    "yum ",
    "apt-",
    "npm ",
    "pip ",
    "go run ",
    "node ",
    "dotnet ",
    "export ",
    "sudo ",
    "cp ",
    "tar ",
    "jq ",
    "vi ",
    "cmake ",
    "syft ",
    "choco ",
];

const USAGE_MARKERS: &[&str] = &[".aggregate", "mongodb://", "mongodb+srv://"];
const RETURN_OBJECT_MARKERS: &[&str] = &["warning", "deprecated", "_id"];
const NON_MONGO_MARKERS: &[&str] = &["cmake "];

/// Only the head of an example is searched for markers.
const MARKER_WINDOW_CHARS: usize = 50;

lazy_static! {
    // `$stage:` starts an aggregation stage. A `<placeholder>` after it makes
    // the example a syntax example instead of a usage example.
    static ref AGGREGATION_STAGE: Regex =
        Regex::new(r"(?s)\$[a-zA-Z]{2,}: ?(.*?<.+?>)?").expect("AGGREGATION_STAGE regex is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageGroup {
    Shell,
    JsonLike,
    DriversMinusJs,
    JavaScript,
    Text,
    Undefined,
    Other,
}

impl LanguageGroup {
    pub fn of(language: &str) -> Self {
        match language {
            BASH | SHELL => LanguageGroup::Shell,
            JSON | XML | YAML => LanguageGroup::JsonLike,
            C | CPP | CSHARP | GO | JAVA | KOTLIN | PHP | PYTHON | RUBY | RUST | SCALA | SWIFT
            | TYPESCRIPT => LanguageGroup::DriversMinusJs,
            JAVASCRIPT => LanguageGroup::JavaScript,
            TEXT => LanguageGroup::Text,
            UNDEFINED => LanguageGroup::Undefined,
            _ => LanguageGroup::Other,
        }
    }

    /// Group whose prompt a fallback classifier should use. Driver projects
    /// document JavaScript and plain text alongside driver code.
    pub fn for_prompt(self, drivers_project: bool) -> Self {
        match self {
            LanguageGroup::JavaScript | LanguageGroup::Text if drivers_project => {
                LanguageGroup::DriversMinusJs
            }
            LanguageGroup::JavaScript | LanguageGroup::Undefined => LanguageGroup::Text,
            group => group,
        }
    }

    /// Categories a fallback classifier may choose from for this group.
    pub fn candidate_categories(&self) -> &'static [Category] {
        match self {
            LanguageGroup::JsonLike => &[
                Category::ExampleReturnObject,
                Category::ExampleConfigurationObject,
            ],
            LanguageGroup::Shell => &[
                Category::NonMongoCommand,
                Category::SyntaxExample,
                Category::ExampleReturnObject,
                Category::ExampleConfigurationObject,
            ],
            LanguageGroup::DriversMinusJs => &[Category::SyntaxExample, Category::UsageExample],
            _ => &Category::ASSIGNABLE,
        }
    }
}

/// Fast local heuristics. Returns `None` when no rule applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl RuleClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn categorize(&self, code: &str, language: &str) -> Option<Category> {
        let code = code.trim();
        self.match_prefix(code, LanguageGroup::of(language))
            .or_else(|| self.match_markers(code))
            .or_else(|| self.match_aggregation(code))
    }

    fn match_prefix(&self, code: &str, group: LanguageGroup) -> Option<Category> {
        let starts_with_any = |prefixes: &[&str]| prefixes.iter().any(|p| code.starts_with(p));

        let command_line = matches!(
            group,
            LanguageGroup::Shell | LanguageGroup::Text | LanguageGroup::Undefined
        );
        if command_line && starts_with_any(SYNTAX_PREFIXES) {
            return Some(Category::SyntaxExample);
        }
        if starts_with_any(NON_MONGO_PREFIXES) {
            return Some(Category::NonMongoCommand);
        }
        if starts_with_any(USAGE_PREFIXES) {
            return Some(Category::UsageExample);
        }
        None
    }

    fn match_markers(&self, code: &str) -> Option<Category> {
        let head = match code.char_indices().nth(MARKER_WINDOW_CHARS) {
            Some((end, _)) => &code[..end],
            None => code,
        };
        let contains_any = |markers: &[&str]| markers.iter().any(|m| head.contains(m));

        if contains_any(USAGE_MARKERS) {
            Some(Category::UsageExample)
        } else if contains_any(RETURN_OBJECT_MARKERS) {
            Some(Category::ExampleReturnObject)
        } else if contains_any(NON_MONGO_MARKERS) {
            Some(Category::NonMongoCommand)
        } else {
            None
        }
    }

    fn match_aggregation(&self, code: &str) -> Option<Category> {
        let captures = AGGREGATION_STAGE.captures(code)?;
        if captures.get(1).is_some_and(|placeholder| !placeholder.as_str().is_empty()) {
            Some(Category::SyntaxExample)
        } else {
            Some(Category::UsageExample)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_groups() {
        assert_eq!(LanguageGroup::of("bash"), LanguageGroup::Shell);
        assert_eq!(LanguageGroup::of("yaml"), LanguageGroup::JsonLike);
        assert_eq!(LanguageGroup::of("rust"), LanguageGroup::DriversMinusJs);
        assert_eq!(LanguageGroup::of("javascript"), LanguageGroup::JavaScript);
        assert_eq!(LanguageGroup::of("undefined"), LanguageGroup::Undefined);
        assert_eq!(LanguageGroup::of("cobol"), LanguageGroup::Other);
    }

    #[test]
    fn test_syntax_prefixes_only_for_command_line_groups() {
        let rules = RuleClassifier::new();
        assert_eq!(
            rules.categorize("atlas clusters list", SHELL),
            Some(Category::SyntaxExample)
        );
        assert_eq!(
            rules.categorize("mongosh \"mongodb+srv://host\"", TEXT),
            Some(Category::SyntaxExample)
        );
        assert_eq!(rules.categorize("atlas clusters list", PYTHON), None);
    }

    #[test]
    fn test_non_mongo_commands() {
        let rules = RuleClassifier::new();
        assert_eq!(
            rules.categorize("  npm install mongodb\n", SHELL),
            Some(Category::NonMongoCommand)
        );
        assert_eq!(
            rules.categorize("docker run -d mongo", UNDEFINED),
            Some(Category::NonMongoCommand)
        );
        assert_eq!(
            rules.categorize("go run main.go", GO),
            Some(Category::NonMongoCommand)
        );
    }

    #[test]
    fn test_usage_prefixes() {
        let rules = RuleClassifier::new();
        assert_eq!(
            rules.categorize("import pymongo\nclient = pymongo.MongoClient()", PYTHON),
            Some(Category::UsageExample)
        );
        assert_eq!(
            rules.categorize("using MongoDB.Driver;", CSHARP),
            Some(Category::UsageExample)
        );
    }

    #[test]
    fn test_markers_only_search_the_head() {
        let rules = RuleClassifier::new();
        assert_eq!(
            rules.categorize("{ \"_id\": 1, \"name\": \"a\" }", JSON),
            Some(Category::ExampleReturnObject)
        );
        assert_eq!(
            rules.categorize("db.orders.aggregate([ ... ])", JAVASCRIPT),
            Some(Category::UsageExample)
        );

        let late_marker = format!("{}_id", "x".repeat(60));
        assert_eq!(rules.categorize(&late_marker, JSON), None);
    }

    #[test]
    fn test_aggregation_stage_with_and_without_placeholder() {
        let rules = RuleClassifier::new();
        assert_eq!(
            rules.categorize("{ $match: { status: \"A\" } }", JAVASCRIPT),
            Some(Category::UsageExample)
        );
        assert_eq!(
            rules.categorize("{ $match: { <query> } }", JAVASCRIPT),
            Some(Category::SyntaxExample)
        );
    }

    #[test]
    fn test_no_rule_applies() {
        let rules = RuleClassifier::new();
        assert_eq!(rules.categorize("client.close()", PYTHON), None);
    }

    #[test]
    fn test_candidate_categories_per_group() {
        assert_eq!(
            LanguageGroup::JsonLike.candidate_categories(),
            &[
                Category::ExampleReturnObject,
                Category::ExampleConfigurationObject
            ]
        );
        assert_eq!(LanguageGroup::Text.candidate_categories().len(), 5);
    }

    #[test]
    fn test_prompt_group_for_drivers_projects() {
        assert_eq!(
            LanguageGroup::JavaScript.for_prompt(true),
            LanguageGroup::DriversMinusJs
        );
        assert_eq!(LanguageGroup::Text.for_prompt(true), LanguageGroup::DriversMinusJs);
        assert_eq!(LanguageGroup::JavaScript.for_prompt(false), LanguageGroup::Text);
        assert_eq!(LanguageGroup::Undefined.for_prompt(true), LanguageGroup::Text);
        assert_eq!(LanguageGroup::Shell.for_prompt(true), LanguageGroup::Shell);
    }
}
