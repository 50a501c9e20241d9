use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::classify::{ClassificationSuggestion, Suggester};
use crate::error::{Error, Result};
use crate::llm::CompletionEngine;
use crate::text_util::strip_code_fences;
use crate::ticket::{Category, Priority};

/// The only response shape accepted from the model.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelAnswer {
    suggested_category: Category,
    suggested_priority: Priority,
}

pub fn build_prompt(description: &str) -> String {
    format!(
        r#"You are a support ticket classification assistant.
Given the following ticket description, suggest the most appropriate category and priority.

Categories: billing, technical, account, general
Priorities: low, medium, high, critical

Description: {description}

Respond with ONLY a JSON object (no markdown, no code fences) in this exact format:
{{"suggested_category": "...", "suggested_priority": "..."}}"#
    )
}

/// Parse a model response into a suggestion. Anything but the strict
/// two-field object with known values is an error.
pub fn parse_response(text: &str) -> Result<ClassificationSuggestion> {
    let json_str = strip_code_fences(text);
    let answer: ModelAnswer = serde_json::from_str(json_str).map_err(|e| {
        Error::Llm(format!(
            "Failed to parse LLM response: {e}\nResponse: {text}"
        ))
    })?;
    Ok(ClassificationSuggestion::new(
        answer.suggested_category,
        answer.suggested_priority,
    ))
}

/// Classifies through a remote model, bounded by a timeout. No retries.
pub struct LlmSuggester {
    engine: Box<dyn CompletionEngine>,
    timeout: Duration,
}

impl LlmSuggester {
    pub fn new(engine: Box<dyn CompletionEngine>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }
}

#[async_trait(?Send)]
impl Suggester for LlmSuggester {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn suggest(&self, description: &str) -> Result<ClassificationSuggestion> {
        let prompt = build_prompt(description);
        let text = tokio::time::timeout(self.timeout, self.engine.complete(&prompt))
            .await
            .map_err(|_| Error::Llm(format!("timed out after {:?}", self.timeout)))??;
        parse_response(&text)
    }
}
