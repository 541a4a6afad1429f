// file: src/classifier/llm.rs
// description: Ollama completion client used as the fallback category classifier
// reference: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-completion

use crate::classifier::rules::LanguageGroup;
use crate::classifier::{CategoryClassifier, CategoryOutcome};
use crate::config::ClassifierConfig;
use crate::error::{AuditError, Result};
use crate::models::Category;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

pub struct OllamaClassifier {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClassifier {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        Self::new(
            config.ollama_url.clone(),
            config.model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AuditError::Classifier(format!(
                    "Failed to reach Ollama at {} (is it running?): {}",
                    self.base_url, e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuditError::Classifier(format!(
                "Ollama request failed with status {}: {}",
                status, error_text
            )));
        }

        let completion: OllamaGenerateResponse = response.json().await.map_err(|e| {
            AuditError::Classifier(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(completion.response)
    }
}

fn definition(category: Category) -> &'static str {
    match category {
        Category::NonMongoCommand => {
            "One or a few lines invoking a common command-line tool such as 'docker ', 'go run', \
             'jq ', 'vi ', 'mkdir ', 'npm ' or 'cd '. Commands starting with 'atlas ' or \
             'mongosh ' are not in this category."
        }
        Category::SyntaxExample => {
            "One or a few lines showing the shape of a command or method call without \
             initializing its arguments. It shows syntax and is not runnable on its own."
        }
        Category::ExampleReturnObject => {
            "Either a sample result document, usually JSON, listing returned fields and often an \
             '_id' field, or text printed to a console such as an error or a short status message."
        }
        Category::ExampleConfigurationObject => {
            "A sample object, usually JSON or YAML, listing required and optional parameters and \
             their types. Anything showing an '_id' field is a return object instead."
        }
        Category::UsageExample => {
            "A longer snippet that sets up its parameters and surrounding context to show how to \
             accomplish a task. Parameters that are used but never initialized make it a syntax \
             example instead."
        }
        Category::Uncategorized => "",
    }
}

/// Builds the categorization prompt, offering only the categories that make
/// sense for the example's language group.
pub fn build_prompt(code: &str, group: LanguageGroup) -> String {
    let candidates = group.candidate_categories();

    let mut question = String::from("I need to sort code examples into one of these categories:\n");
    for category in candidates {
        question.push_str(category.as_str());
        question.push('\n');
    }
    question.push_str("Use these definitions for each category to help categorize the code example:\n");
    for category in candidates {
        question.push_str(&format!("{}: {}\n", category.as_str(), definition(*category)));
    }
    question.push_str(
        "Using these definitions, which category applies to this code example? \
         Don't list an explanation, only list the category name.",
    );

    format!(
        "Use the following pieces of context to answer the question at the end.\nContext: {}\nQuestion: {}",
        code, question
    )
}

#[async_trait]
impl CategoryClassifier for OllamaClassifier {
    async fn classify(
        &self,
        code: &str,
        language: &str,
        drivers_project: bool,
    ) -> Result<CategoryOutcome> {
        let group = LanguageGroup::of(language).for_prompt(drivers_project);
        debug!(
            "Requesting category from Ollama for {} chars of {}",
            code.len(),
            language
        );

        let completion = self.complete(build_prompt(code, group)).await?;
        let category = Category::parse_loose(&completion);
        if category == Category::Uncategorized {
            warn!(
                "Ollama answered with an unknown category: {:?}",
                completion.trim()
            );
        }

        Ok(CategoryOutcome::fallback(category))
    }
}
