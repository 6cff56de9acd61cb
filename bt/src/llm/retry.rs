//! Shared HTTP retry loop for the provider clients

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use tracing::{debug, warn};

use super::LlmError;

/// How a provider wants transient failures handled
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt
    pub initial_backoff: Duration,
    /// Statuses worth another attempt
    pub retryable: &'static [u16],
    /// Seconds reported for a 429 without `retry-after`.
    /// `None` treats such a 429 like any other retryable status.
    pub default_retry_after: Option<u64>,
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Send the request built by `build` until it succeeds or retries run out
///
/// Returns the first 2xx response. Non-retryable statuses fail immediately
/// with [`LlmError::ApiError`] carrying the response body.
pub(crate) async fn send_with_retry<F>(policy: &RetryPolicy, build: F) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let backoff = policy.backoff(attempt);
            warn!(
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                "send_with_retry: retrying after transient error"
            );
            tokio::time::sleep(backoff).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(attempt, error = %e, "send_with_retry: network error");
                last_error = Some(LlmError::Network(e));
                continue;
            }
        };

        let status = response.status().as_u16();
        if response.status().is_success() {
            debug!(attempt, status, "send_with_retry: success");
            return Ok(response);
        }

        if status == 429
            && let Some(secs) = retry_after_secs(&response).or(policy.default_retry_after)
        {
            debug!(retry_after = secs, "send_with_retry: rate limited (429)");
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(secs),
            });
        }

        let message = response.text().await.unwrap_or_default();
        let error = LlmError::ApiError { status, message };
        if policy.retryable.contains(&status) && attempt < policy.max_retries {
            debug!(attempt, status, "send_with_retry: retryable status");
            last_error = Some(error);
            continue;
        }

        debug!(status, "send_with_retry: API error");
        return Err(error);
    }

    Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
}
