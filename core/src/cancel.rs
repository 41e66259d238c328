//! Cooperative cancellation for blocking fetches and backoff sleeps.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A cloneable flag that aborts in-flight retry loops.
///
/// Sleeping through `sleep` wakes as soon as `cancel` is called from any
/// clone. A fetch checks the flag before connecting and between reads, so a
/// blocked read still runs until its own timeout.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        self.inner.wakeup.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for `duration` or until cancelled.
    ///
    /// Returns `false` if the token was cancelled before the time elapsed.
    /// A duration past the clock's range waits until cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *cancelled {
            return false;
        }

        let Some(deadline) = Instant::now().checked_add(duration) else {
            while !*cancelled {
                cancelled = self
                    .inner
                    .wakeup
                    .wait(cancelled)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            return false;
        };
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            cancelled = self
                .inner
                .wakeup
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        false
    }
}
