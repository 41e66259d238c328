//! Reusable client bundling fetch settings, a retry policy, a cancellation
//! token and an optional rate limit.
//!
//! # Design
//! `Client` holds no sockets; each call opens and closes its own, so a
//! client can be shared by reference across threads. Cloning shares the
//! cancellation token and the rate limiter: one thread can abort the retry
//! loops of every clone, and attempts from all clones draw on the same
//! per-minute budget.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::config::{FetchConfig, RetryPolicy};
use crate::error::FetchError;
use crate::http::HttpResponse;
use crate::rate::RateLimiter;
use crate::retry::retry;
use crate::transport::fetch;
use crate::url::ParsedUrl;

#[derive(Debug, Clone, Default)]
pub struct Client {
    config: FetchConfig,
    retry: RetryPolicy,
    cancel: CancellationToken,
    limiter: Option<Arc<Mutex<RateLimiter>>>,
}

impl Client {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Space every attempt, retries included, at least
    /// `60s / max_requests_per_minute` apart. Zero removes the limit.
    #[must_use]
    pub fn with_rate_limit(mut self, max_requests_per_minute: u32) -> Self {
        self.limiter = (max_requests_per_minute > 0)
            .then(|| Arc::new(Mutex::new(RateLimiter::per_minute(max_requests_per_minute))));
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Minimum spacing between attempts, if a rate limit is set.
    pub fn rate_interval(&self) -> Option<Duration> {
        self.limiter.as_ref().map(|limiter| lock(limiter).interval())
    }

    /// One attempt, no retries.
    pub fn fetch(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let url = ParsedUrl::parse(url)?;
        self.attempt(&url)
    }

    /// Up to `max_retries + 1` attempts with exponential backoff. With a rate
    /// limit, each attempt also waits for its slot after the backoff.
    pub fn fetch_with_retry(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let url = ParsedUrl::parse(url)?;
        retry(&self.retry, &self.cancel, |_| self.attempt(&url))
    }

    /// Body from `fetch_with_retry`, or `None` on any failure.
    pub fn retrieve(&self, url: &str) -> Option<Vec<u8>> {
        self.fetch_with_retry(url).map(|response| response.body).ok()
    }

    fn attempt(&self, url: &ParsedUrl) -> Result<HttpResponse, FetchError> {
        self.throttle()?;
        fetch(url, &self.config, &self.cancel)
    }

    /// Held across the wait so clones queue up behind one another.
    fn throttle(&self) -> Result<(), FetchError> {
        match &self.limiter {
            Some(limiter) => lock(limiter).acquire(&self.cancel),
            None => Ok(()),
        }
    }
}

fn lock(limiter: &Mutex<RateLimiter>) -> MutexGuard<'_, RateLimiter> {
    limiter.lock().unwrap_or_else(PoisonError::into_inner)
}
