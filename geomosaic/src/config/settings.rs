//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. The
//! builder configs the library components take are derived from them here.

use std::path::PathBuf;
use std::time::Duration;

use super::{FetchConfig, PatchConfig, PostprocessConfig};
use crate::fetch::RetryPolicy;
use crate::geo::Crs;
use crate::matrix::ImageryCatalog;
use crate::raster::Resampling;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub imagery: ImagerySettings,
    pub download: DownloadSettings,
    pub postprocess: PostprocessSettings,
    pub patches: PatchesSettings,
    pub labels: LabelsSettings,
    pub logging: LoggingSettings,
    /// Built-in services with `[service.*]` sections applied
    pub catalog: ImageryCatalog,
}

/// Mosaic output defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagerySettings {
    /// Ground size of one output pixel (metres)
    pub pixel_size: f64,
    /// Coverage added around each bounding box (metres)
    pub padding: f64,
    pub target_crs: Crs,
    pub resampling: Resampling,
    pub output_dir: PathBuf,
}

/// Tile download behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub workers: usize,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_factor: u32,
    pub backoff_max_secs: u64,
    pub pacing_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostprocessSettings {
    pub warp_timeout_secs: u64,
}

/// Patch extraction defaults. Sizes are in metres.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchesSettings {
    pub width: f64,
    pub height: f64,
    pub compress: bool,
    pub jpeg_quality: u8,
    pub overwrite: bool,
}

/// Feature service for liveability labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelsSettings {
    pub wfs_url: String,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
    /// Mirror log lines to stdout
    pub stdout: bool,
}

impl ConfigFile {
    pub fn fetch_config(&self) -> FetchConfig {
        let d = &self.download;
        let retry = RetryPolicy::new()
            .with_max_retries(d.max_retries)
            .with_base_delay(Duration::from_millis(d.backoff_base_ms))
            .with_factor(d.backoff_factor)
            .with_max_delay(Duration::from_secs(d.backoff_max_secs));
        FetchConfig::new()
            .with_workers(d.workers)
            .with_retry(retry)
            .with_pacing(Duration::from_millis(d.pacing_ms))
            .with_request_timeout(Duration::from_secs(d.request_timeout_secs))
    }

    pub fn postprocess_config(&self) -> PostprocessConfig {
        PostprocessConfig::new()
            .with_warp_timeout(Duration::from_secs(self.postprocess.warp_timeout_secs))
            .with_resampling(self.imagery.resampling)
    }

    pub fn patch_config(&self) -> PatchConfig {
        let p = &self.patches;
        PatchConfig::new()
            .with_size(p.width, p.height)
            .with_compress(p.compress)
            .with_jpeg_quality(p.jpeg_quality)
            .with_overwrite(p.overwrite)
    }
}
