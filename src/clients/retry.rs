//! Exponential backoff shared by the provider clients

use std::future::Future;
use std::time::Duration;

use crate::clients::traits::LlmError;

const BASE_DELAY_MS: u64 = 200;

/// Client errors other than rate limiting will not improve on retry
pub fn is_retryable(err: &LlmError) -> bool {
    match err {
        LlmError::Http { status, .. } => *status == 429 || *status >= 500,
        LlmError::Transport(_) => true,
        LlmError::Parse(_) | LlmError::Empty => false,
    }
}

/// Run `op` up to `attempts` times, sleeping 200ms * 2^i between tries
pub async fn with_backoff<F, Fut, T>(attempts: u32, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let attempts = attempts.max(1);
    let mut last_err = None;
    for i in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let retry = is_retryable(&err) && i + 1 < attempts;
                tracing::debug!(attempt = i + 1, retry, "Provider call failed: {}", err);
                last_err = Some(err);
                if !retry {
                    break;
                }
                let delay_ms = BASE_DELAY_MS * (1u64 << i);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
    Err(last_err.unwrap_or(LlmError::Empty))
}
