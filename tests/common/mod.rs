#![allow(dead_code)]

use ai_bookmark_organizer::domain::error::{ErrorDetail, ProviderError};
use ai_bookmark_organizer::domain::model::Bookmark;
use ai_bookmark_organizer::domain::traits::{CompletionProvider, CompletionRequest};
use ai_bookmark_organizer::usecase::classify::{ClassifyOptions, RetryPolicy};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Replays canned completions in order and records every request.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "SCRIPTED"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().expect("requests lock").push(request.clone());
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::malformed("SCRIPTED", "script exhausted")))
    }
}

pub fn http_error(status: u16, error_type: &str) -> ProviderError {
    ProviderError::from_http(
        "SCRIPTED",
        ErrorDetail {
            message: format!("status {status}"),
            error_type: error_type.to_string(),
            code: "unknown".to_string(),
            status: Some(status),
        },
    )
}

pub fn quota_exhausted() -> ProviderError {
    http_error(402, "insufficient_balance")
}

/// A classification reply with one `[n]` section per `(tags, folder)` pair.
pub fn reply(entries: &[(&str, &str)]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, (tags, folder))| format!("[{}]\nTags: {tags}\nFolder: {folder}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn bookmark(title: &str, url: &str) -> Bookmark {
    Bookmark {
        title: title.to_string(),
        url: url.to_string(),
        ..Bookmark::default()
    }
}

pub fn numbered_bookmarks(n: usize) -> Vec<Bookmark> {
    (0..n)
        .map(|i| bookmark(&format!("b{i}"), &format!("https://example.com/{i}")))
        .collect()
}

/// Default options without any sleeping.
pub fn fast_options(batch_size: usize) -> ClassifyOptions {
    ClassifyOptions {
        batch_size,
        retry: RetryPolicy {
            max_retries: 3,
            base_delay: Duration::ZERO,
        },
        inter_batch_delay: Duration::ZERO,
        custom_prompt: None,
    }
}
