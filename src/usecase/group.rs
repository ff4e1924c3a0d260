//! Reduces many suggested folder names to a bounded set of top-level categories.

use crate::domain::error::ProviderError;
use crate::domain::model::CategoryGrouping;
use crate::domain::traits::{CompletionProvider, CompletionRequest};
use crate::infrastructure::schema_validator::validate_category_grouping;
use crate::usecase::classify::{call_with_retry, RetryPolicy, CLASSIFY_TEMPERATURE};
use crate::usecase::event::EventSink;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

pub const GROUPER_SYSTEM: &str = "You are a bookmark organization assistant. Return only valid JSON that matches the requested format exactly.";

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*|\s*```").expect("valid code fence regex"));

pub struct CategoryGrouper<'a> {
    provider: &'a dyn CompletionProvider,
    retry: RetryPolicy,
    custom_prompt: Option<String>,
    sink: EventSink,
}

impl<'a> CategoryGrouper<'a> {
    pub fn new(provider: &'a dyn CompletionProvider, retry: RetryPolicy) -> Self {
        Self {
            provider,
            retry,
            custom_prompt: None,
            sink: None,
        }
    }

    pub fn with_custom_prompt(mut self, custom_prompt: Option<String>) -> Self {
        self.custom_prompt = custom_prompt;
        self
    }

    pub fn with_sink(mut self, sink: EventSink) -> Self {
        self.sink = sink;
        self
    }

    /// The returned grouping is not guaranteed to be a total or exact partition.
    pub async fn group_folders(
        &self,
        folder_names: &BTreeSet<String>,
        target_count: usize,
    ) -> Result<CategoryGrouping, ProviderError> {
        let request = CompletionRequest {
            system: GROUPER_SYSTEM.to_string(),
            prompt: build_grouping_prompt(folder_names, target_count, self.custom_prompt.as_deref()),
            temperature: CLASSIFY_TEMPERATURE,
        };

        let content = call_with_retry(&self.retry, &self.sink, || {
            self.provider.complete(&request)
        })
        .await?;

        parse_grouping(self.provider.name(), &content)
    }
}

pub fn build_grouping_prompt(
    folder_names: &BTreeSet<String>,
    target_count: usize,
    custom_prompt: Option<&str>,
) -> String {
    let folders: Vec<&str> = folder_names.iter().map(String::as_str).collect();
    let extra = custom_prompt
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("\n\nAdditional instructions: {s}"))
        .unwrap_or_default();

    format!(
        r#"You are organizing browser bookmarks into a hierarchical structure.
Given these {count} folder names, create exactly {target_count} broad top-level categories.
Each category should be generic enough to accommodate multiple related topics.

Current folders to organize:
{folders}

Requirements:
1. Create exactly {target_count} broad, inclusive categories
2. Every folder MUST be assigned to a category
3. Categories should be clear and intuitive for a bookmark hierarchy
4. Avoid overlapping categories
5. Use generic names that can encompass related subcategories
6. Consider common bookmark organization patterns{extra}

Return the result as a JSON object where:
- Keys are the new top-level category names (exactly {target_count})
- Values are arrays of existing folder names that should go under each category
- Every existing folder must be assigned to exactly one category
- Category names should be clear and concise

Example format:
{{
  "Technology & Development": ["Programming", "Web Development", "Software", "Tools"],
  "Business & Work": ["Projects", "Marketing", "Resources", "Professional"],
  "Media & Entertainment": ["Movies", "Music", "Games", "Videos"]
}}"#,
        count = folder_names.len(),
        folders = folders.join("\n"),
    )
}

/// Strips code fences and surrounding prose, returning the JSON object text.
pub fn unwrap_structured_payload(text: &str) -> Option<String> {
    let stripped = CODE_FENCE.replace_all(text, "");
    let trimmed = stripped.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed.to_string());
    }

    warn!("API response doesn't appear to be valid JSON. Attempting to extract JSON content...");
    first_balanced_object(trimmed).map(str::to_string)
}

fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

pub fn parse_grouping(provider: &str, content: &str) -> Result<CategoryGrouping, ProviderError> {
    let payload = unwrap_structured_payload(content).ok_or_else(|| {
        ProviderError::malformed(provider, "Unable to extract valid JSON from API response")
    })?;

    let value: Value = serde_json::from_str(&payload)
        .map_err(|e| ProviderError::malformed(provider, format!("JSON Parse error: {e}")))?;
    validate_category_grouping(&value)
        .map_err(|e| ProviderError::malformed(provider, e.to_string()))?;

    let raw: BTreeMap<String, Vec<String>> = serde_json::from_value(value)
        .map_err(|e| ProviderError::malformed(provider, format!("JSON Parse error: {e}")))?;

    let mut categories: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (category, folders) in raw {
        let category = category.trim();
        if category.is_empty() {
            continue;
        }
        categories.entry(category.to_string()).or_default().extend(
            folders
                .iter()
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        );
    }

    if categories.is_empty() {
        return Err(ProviderError::malformed(provider, "grouping has no categories"));
    }

    Ok(CategoryGrouping::new(categories))
}
