//! Tile download configuration.

use std::time::Duration;

use crate::fetch::RetryPolicy;

/// Parameters for [`TileFetcher`](crate::fetch::TileFetcher).
///
/// # Example
///
/// ```
/// use geomosaic::config::FetchConfig;
/// use std::time::Duration;
///
/// let config = FetchConfig::default();
/// assert_eq!(config.workers(), 4);
/// assert_eq!(config.retry().max_attempts(), 11);
/// assert_eq!(config.pacing(), Duration::from_millis(25));
///
/// let config = FetchConfig::new()
///     .with_workers(8)
///     .with_pacing(Duration::ZERO);
/// assert_eq!(config.workers(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Maximum number of tiles in flight
    workers: usize,
    /// Retry schedule for one tile
    retry: RetryPolicy,
    /// Pause a worker takes after each successful tile
    pacing: Duration,
    /// Limit for one HTTP request
    request_timeout: Duration,
}

impl FetchConfig {
    pub const DEFAULT_WORKERS: usize = 4;
    pub const DEFAULT_PACING: Duration = Duration::from_millis(25);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count. Zero is raised to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: Self::DEFAULT_WORKERS,
            retry: RetryPolicy::default(),
            pacing: Self::DEFAULT_PACING,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
