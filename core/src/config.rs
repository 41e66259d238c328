//! Caller-supplied knobs for a fetch, a retry loop and a rate limiter.

use std::time::Duration;

use crate::auth::basic_auth;

pub const DEFAULT_USER_AGENT: &str = concat!("fetch-core/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_FACTOR: Duration = Duration::from_secs(2);

/// Per-request settings: optional headers, the status that counts as
/// success, and the timeout applied to connect and to every read/write.
/// A zero timeout blocks indefinitely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub user_agent: Option<String>,
    pub authorization: Option<String>,
    pub expected_status: u16,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            authorization: None,
            expected_status: DEFAULT_EXPECTED_STATUS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Omit the `User-Agent` header entirely.
    #[must_use]
    pub fn without_user_agent(mut self) -> Self {
        self.user_agent = None;
        self
    }

    /// Send `value` verbatim as the `Authorization` header.
    #[must_use]
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_basic_auth(self, username: &str, password: &str) -> Self {
        self.with_authorization(basic_auth(username, password))
    }

    #[must_use]
    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// How many times to retry and how long to wait in between.
///
/// The delay before retry `k` (1-based) is `backoff_factor * 2^(k-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_backoff_factor(mut self, backoff_factor: Duration) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Total number of attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
