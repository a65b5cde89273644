//! Retry policy and the clock it sleeps on.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;

/// Something that can sleep.
pub trait Timer: Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Sleeps on the tokio clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fake clock: records requested sleeps and returns at once.
#[derive(Debug, Default)]
pub struct RecordingTimer {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    /// Sum of all requested sleeps.
    pub fn total(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

impl Timer for RecordingTimer {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Returned when every attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Exponential backoff: the `k`-th retry waits `base × factor^k`, capped at
/// `max_delay`.
///
/// ```
/// use geomosaic::fetch::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 11);
/// assert_eq!(policy.delay_before_retry(1), Duration::from_secs(3));
/// assert_eq!(policy.delay_before_retry(2), Duration::from_secs(9));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    factor: u32,
    max_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 10;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
    pub const DEFAULT_FACTOR: u32 = 3;
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(300);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_factor(mut self, factor: u32) -> Self {
        self.factor = factor.max(1);
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// One initial attempt plus the retries.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let nanos = (self.factor as u128)
            .checked_pow(retry)
            .and_then(|m| self.base_delay.as_nanos().checked_mul(m))
            .unwrap_or(u128::MAX)
            .min(self.max_delay.as_nanos())
            .min(u64::MAX as u128);
        Duration::from_nanos(nanos as u64)
    }

    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// `on_failure(attempt, error, next_delay)` is called after every failed
    /// attempt; `next_delay` is `None` after the last one. No sleep follows
    /// the final failure.
    pub async fn run<T, E, Tm, Op, Fut, F>(
        &self,
        timer: &Tm,
        mut op: Op,
        mut on_failure: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        Tm: Timer,
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        F: FnMut(u32, &E, Option<Duration>),
    {
        let attempts = self.max_attempts();
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= attempts => {
                    on_failure(attempt, &error, None);
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: error,
                    });
                }
                Err(error) => {
                    let delay = self.delay_before_retry(attempt);
                    on_failure(attempt, &error, Some(delay));
                    timer.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            base_delay: Self::DEFAULT_BASE_DELAY,
            factor: Self::DEFAULT_FACTOR,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }
}
