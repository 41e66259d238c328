//! Exponential-backoff retry around the fetcher.
//!
//! # Design
//! The loop is generic over the operation so the attempt/sleep schedule is
//! testable without sockets. Errors that `FetchError::is_retryable` rejects
//! (a malformed URL, cancellation) end the loop immediately; everything
//! else is retried until the policy's budget runs out, and the last error
//! is returned.

use std::time::Duration;

use log::{info, warn};

use crate::cancel::CancellationToken;
use crate::config::{FetchConfig, RetryPolicy};
use crate::error::FetchError;
use crate::http::HttpResponse;
use crate::transport::fetch;
use crate::url::ParsedUrl;

/// Delay before retry number `retry` (1 = the sleep after the first failure).
///
/// `backoff_factor * 2^(retry - 1)`, saturating instead of overflowing.
pub fn backoff_delay(policy: &RetryPolicy, retry: u32) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry.saturating_sub(1));
    policy.backoff_factor.saturating_mul(multiplier)
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy allows no more attempts. `op` receives the 0-based attempt number.
///
/// Sleeps between attempts are cut short by `cancel`.
pub fn retry<T, F>(policy: &RetryPolicy, cancel: &CancellationToken, op: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Result<T, FetchError>,
{
    retry_with_sleep(policy, |delay| cancel.sleep(delay), op)
}

fn retry_with_sleep<T, S, F>(policy: &RetryPolicy, mut sleep: S, mut op: F) -> Result<T, FetchError>
where
    S: FnMut(Duration) -> bool,
    F: FnMut(u32) -> Result<T, FetchError>,
{
    let attempts = policy.max_attempts();
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = backoff_delay(policy, attempt);
            info!("retrying in {delay:?} (attempt {} of {attempts})", attempt + 1);
            if !sleep(delay) {
                return Err(FetchError::Cancelled);
            }
        }
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                warn!("attempt {} of {attempts} failed: {e}", attempt + 1);
                attempt += 1;
                if attempt >= attempts {
                    return Err(e);
                }
            }
        }
    }
}

/// Parse `url` once, then fetch it under `policy`.
pub fn retry_fetch(
    url: &str,
    config: &FetchConfig,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<HttpResponse, FetchError> {
    let url = ParsedUrl::parse(url)?;
    retry(policy, cancel, |_| fetch(&url, config, cancel))
}

/// Body of `url` after up to `policy.max_retries` retries, or `None`.
pub fn retry_request(url: &str, config: &FetchConfig, policy: &RetryPolicy) -> Option<Vec<u8>> {
    retry_fetch(url, config, policy, &CancellationToken::new())
        .map(|response| response.body)
        .ok()
}
