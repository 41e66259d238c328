//! Client-side request spacing.

use std::time::{Duration, Instant};

use log::debug;

use crate::cancel::CancellationToken;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::transport::fetch_body;

/// Keeps successive requests at least `60s / max_requests_per_minute` apart.
///
/// The first request goes out immediately. A limit of zero disables
/// spacing.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn per_minute(max_requests_per_minute: u32) -> Self {
        let interval = match max_requests_per_minute {
            0 => Duration::ZERO,
            n => Duration::from_secs(60) / n,
        };
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How long `acquire` would block if called at `now`.
    pub fn wait_time(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => (last + self.interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Wait for the next slot and claim it.
    pub fn acquire(&mut self, cancel: &CancellationToken) -> Result<(), FetchError> {
        let wait = self.wait_time(Instant::now());
        if !wait.is_zero() {
            debug!("rate limit: waiting {wait:?}");
            if !cancel.sleep(wait) {
                return Err(FetchError::Cancelled);
            }
        }
        self.last = Some(Instant::now());
        Ok(())
    }

    /// Fetch `url` once a slot is free.
    pub fn fetch_body(
        &mut self,
        url: &str,
        config: &FetchConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, FetchError> {
        self.acquire(cancel)?;
        fetch_body(url, config, cancel)
    }
}
