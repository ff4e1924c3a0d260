//! Batched classification calls against a [`CompletionProvider`].

mod prompt;
mod retry;

pub use prompt::{build_classification_prompt, parse_classification_response, CLASSIFIER_SYSTEM};
pub use retry::{call_with_retry, RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};

use crate::domain::error::ProviderError;
use crate::domain::model::{Bookmark, Classification};
use crate::domain::traits::{CompletionProvider, CompletionRequest};
use crate::usecase::event::{emit, AppEvent, EventSink};
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(1000);
pub const CLASSIFY_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyOptions {
    pub batch_size: usize,
    pub retry: RetryPolicy,
    pub inter_batch_delay: Duration,
    pub custom_prompt: Option<String>,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
            custom_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassificationOutcome {
    /// In input order; failed batches leave gaps.
    pub classifications: Vec<Classification>,
    /// Bookmarks left without a classification, including those never sent
    /// because the run was aborted.
    pub failed_bookmarks: usize,
    pub failed_batches: usize,
    /// Set when a quota or credential failure stopped the remaining batches.
    pub aborted: Option<ProviderError>,
}

pub struct ClassificationOrchestrator<'a> {
    provider: &'a dyn CompletionProvider,
    options: ClassifyOptions,
    sink: EventSink,
}

impl<'a> ClassificationOrchestrator<'a> {
    pub fn new(provider: &'a dyn CompletionProvider, options: ClassifyOptions) -> Self {
        Self {
            provider,
            options,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: EventSink) -> Self {
        self.sink = sink;
        self
    }

    pub async fn classify_all(&self, bookmarks: &[Bookmark]) -> ClassificationOutcome {
        let batch_size = self.options.batch_size.max(1);
        let total = bookmarks.len().div_ceil(batch_size);
        let mut outcome = ClassificationOutcome::default();

        for (index, batch) in bookmarks.chunks(batch_size).enumerate() {
            info!(
                "Processing batch {}/{} ({} bookmarks)",
                index + 1,
                total,
                batch.len()
            );
            emit(
                &self.sink,
                AppEvent::BatchStarted {
                    index: index + 1,
                    total,
                    size: batch.len(),
                },
            )
            .await;

            match self.classify_batch(batch).await {
                Ok(results) => {
                    outcome.classifications.extend(results);
                    if index + 1 < total && !self.options.inter_batch_delay.is_zero() {
                        tokio::time::sleep(self.options.inter_batch_delay).await;
                    }
                }
                Err(err) if err.aborts_run() => {
                    let remaining = bookmarks.len() - index * batch_size;
                    error!("{err}");
                    error!(
                        "Stopping classification: {} batch(es) and {} bookmark(s) left unprocessed",
                        total - index,
                        remaining
                    );
                    emit(
                        &self.sink,
                        AppEvent::ClassificationAborted {
                            reason: err.to_string(),
                            remaining_batches: total - index,
                        },
                    )
                    .await;
                    outcome.failed_batches += 1;
                    outcome.failed_bookmarks += remaining;
                    outcome.aborted = Some(err);
                    break;
                }
                Err(err) => {
                    error!("Failed to classify batch of {} bookmarks: {err}", batch.len());
                    emit(
                        &self.sink,
                        AppEvent::BatchFailed {
                            index: index + 1,
                            size: batch.len(),
                            reason: err.to_string(),
                        },
                    )
                    .await;
                    outcome.failed_batches += 1;
                    outcome.failed_bookmarks += batch.len();
                }
            }
        }

        if outcome.failed_bookmarks > 0 {
            warn!(
                "{} bookmarks could not be classified.",
                outcome.failed_bookmarks
            );
        }

        outcome
    }

    async fn classify_batch(&self, batch: &[Bookmark]) -> Result<Vec<Classification>, ProviderError> {
        let request = CompletionRequest {
            system: CLASSIFIER_SYSTEM.to_string(),
            prompt: build_classification_prompt(batch, self.options.custom_prompt.as_deref()),
            temperature: CLASSIFY_TEMPERATURE,
        };

        let content = call_with_retry(&self.options.retry, &self.sink, || {
            self.provider.complete(&request)
        })
        .await?;

        if content.trim().is_empty() {
            return Err(ProviderError::malformed(
                self.provider.name(),
                "No response from AI",
            ));
        }

        Ok(parse_classification_response(&content, batch))
    }
}
