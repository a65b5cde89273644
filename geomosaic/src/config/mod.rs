//! Configuration for geomosaic components.
//!
//! [`ConfigFile`] mirrors `~/.geomosaic/config.ini` section by section; the
//! builder configs the library components take ([`FetchConfig`],
//! [`PostprocessConfig`], [`PatchConfig`]) are derived from it and can also
//! be built directly.
//!
//! # Example
//!
//! ```
//! use geomosaic::config::{ConfigFile, FetchConfig};
//! use std::time::Duration;
//!
//! let file = ConfigFile::default();
//! assert_eq!(file.fetch_config(), FetchConfig::default());
//!
//! let fetch = FetchConfig::new()
//!     .with_workers(2)
//!     .with_request_timeout(Duration::from_secs(10));
//! assert_eq!(fetch.workers(), 2);
//! ```

mod defaults;
mod fetch;
mod file;
mod parser;
mod patches;
mod postprocess;
mod settings;

pub use defaults::*;
pub use fetch::FetchConfig;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use patches::PatchConfig;
pub use postprocess::PostprocessConfig;
pub use settings::{
    ConfigFile, DownloadSettings, ImagerySettings, LabelsSettings, LoggingSettings,
    PatchesSettings, PostprocessSettings,
};
