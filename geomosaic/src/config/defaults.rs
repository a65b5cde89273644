//! Default values for every configuration setting, and
//! `ConfigFile::default()`.

use std::path::PathBuf;

use super::settings::*;
use crate::geo::RD_NEW;
use crate::labels::{DEFAULT_PAGE_SIZE, DEFAULT_WFS_URL};
use crate::matrix::ImageryCatalog;
use crate::raster::Resampling;

// [imagery]
pub const DEFAULT_PIXEL_SIZE: f64 = 1.0;
pub const DEFAULT_PADDING_M: f64 = 1200.0;
pub const DEFAULT_OUTPUT_DIR: &str = "data/tiles";

// [download]
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
pub const DEFAULT_BACKOFF_FACTOR: u32 = 3;
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;
pub const DEFAULT_PACING_MS: u64 = 25;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// [postprocess]
pub const DEFAULT_WARP_TIMEOUT_SECS: u64 = 300;

// [patches]
pub const DEFAULT_PATCH_SIZE_M: f64 = 700.0;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Default log file (~/.geomosaic/geomosaic.log).
pub fn default_log_file() -> PathBuf {
    super::file::config_directory().join("geomosaic.log")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            imagery: ImagerySettings {
                pixel_size: DEFAULT_PIXEL_SIZE,
                padding: DEFAULT_PADDING_M,
                target_crs: RD_NEW,
                resampling: Resampling::Bilinear,
                output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            },
            download: DownloadSettings {
                workers: DEFAULT_WORKERS,
                max_retries: DEFAULT_MAX_RETRIES,
                backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
                backoff_factor: DEFAULT_BACKOFF_FACTOR,
                backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
                pacing_ms: DEFAULT_PACING_MS,
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            },
            postprocess: PostprocessSettings {
                warp_timeout_secs: DEFAULT_WARP_TIMEOUT_SECS,
            },
            patches: PatchesSettings {
                width: DEFAULT_PATCH_SIZE_M,
                height: DEFAULT_PATCH_SIZE_M,
                compress: true,
                jpeg_quality: DEFAULT_JPEG_QUALITY,
                overwrite: false,
            },
            labels: LabelsSettings {
                wfs_url: DEFAULT_WFS_URL.to_string(),
                page_size: DEFAULT_PAGE_SIZE,
            },
            logging: LoggingSettings {
                file: default_log_file(),
                stdout: true,
            },
            catalog: ImageryCatalog::netherlands(),
        }
    }
}
