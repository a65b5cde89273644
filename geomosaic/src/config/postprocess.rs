//! Canvas finalization configuration.

use std::time::Duration;

use crate::raster::Resampling;

/// Parameters for [`RasterPostprocessor`](crate::postprocess::RasterPostprocessor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostprocessConfig {
    /// Hard limit on one warp; exceeding it fails the build
    warp_timeout: Duration,
    resampling: Resampling,
}

impl PostprocessConfig {
    pub const DEFAULT_WARP_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_warp_timeout(mut self, timeout: Duration) -> Self {
        self.warp_timeout = timeout;
        self
    }

    pub fn with_resampling(mut self, resampling: Resampling) -> Self {
        self.resampling = resampling;
        self
    }

    pub fn warp_timeout(&self) -> Duration {
        self.warp_timeout
    }

    pub fn resampling(&self) -> Resampling {
        self.resampling
    }
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            warp_timeout: Self::DEFAULT_WARP_TIMEOUT,
            resampling: Resampling::default(),
        }
    }
}
