//! HTTP plumbing shared by both providers: client construction, status
//! checks and bounded retry with exponential backoff.

use std::time::Duration;

use tracing::warn;

use super::config::{LlmTimeouts, RetryPolicy};
use super::types::LlmError;

/// Longest backoff is `base * 2^MAX_BACKOFF_SHIFT`.
const MAX_BACKOFF_SHIFT: u32 = 5;

/// # Errors
///
/// Returns [`LlmError::HttpClient`] if the TLS backend cannot initialize.
pub(super) fn build_http(timeouts: LlmTimeouts) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeouts.request)
        .connect_timeout(timeouts.connect)
        .build()
        .map_err(|e| LlmError::HttpClient(e.to_string()))
}

/// Delay before retry number `attempt` (1-based).
pub(super) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    base.saturating_mul(1 << shift)
}

/// Send `request` and return the body of a 2xx reply, retrying retryable
/// failures up to `policy.max_attempts` in total.
pub(super) async fn send(request: reqwest::RequestBuilder, policy: RetryPolicy) -> Result<String, LlmError> {
    let mut attempt = 1;
    loop {
        // Streaming bodies cannot be cloned; those get a single shot.
        let Some(this_try) = request.try_clone() else {
            return send_once(request).await;
        };
        match send_once(this_try).await {
            Err(e) if e.retryable() && attempt < policy.max_attempts => {
                let delay = backoff_delay(policy.backoff, attempt);
                warn!(attempt, error = %e, ?delay, "llm request failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn send_once(request: reqwest::RequestBuilder) -> Result<String, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| LlmError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| LlmError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(LlmError::Status { status: status.as_u16(), body });
    }
    Ok(body)
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
