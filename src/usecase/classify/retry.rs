use crate::domain::error::{ProviderError, RetryClass};
use crate::usecase::event::{emit, AppEvent, EventSink};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Linear backoff: 1x, 2x, 3x the base delay.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.base_delay
            .saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

/// Runs `call` until it succeeds, hits a non-retryable error, or exhausts `policy`.
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    sink: &EventSink,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let retryable = matches!(
            err.retry_class(),
            RetryClass::RateLimited | RetryClass::Recoverable
        );
        if !retryable || attempt >= policy.max_retries {
            return Err(err);
        }

        attempt += 1;
        let delay = policy.delay_for(attempt);
        warn!(
            attempt,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            "API call failed, retrying: {err}"
        );
        emit(
            sink,
            AppEvent::RetryScheduled {
                attempt,
                max_retries: policy.max_retries,
                delay_ms: delay.as_millis() as u64,
                kind: err.kind,
            },
        )
        .await;
        tokio::time::sleep(delay).await;
    }
}
