//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use geomosaic::config::ConfigFileError;
use geomosaic::labels::LabelError;
use geomosaic::matrix::MatrixError;
use geomosaic::mosaic::MosaicError;
use geomosaic::provider::SourceError;
use geomosaic::raster::RasterError;
use geomosaic::segment::PatchError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file error
    Config(ConfigFileError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to create the HTTP client
    HttpClient(SourceError),
    /// Mosaic build failed
    Mosaic(MosaicError),
    /// Failed to read the input mosaic
    ReadMosaic { path: PathBuf, error: RasterError },
    /// Patch extraction could not start
    Patches(PatchError),
    /// Label fetch or GeoJSON I/O failed
    Labels(LabelError),
}

impl CliError {
    /// Exit code for this error: 2 for configuration problems, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Mosaic(MosaicError::Matrix(MatrixError::UnsupportedYear(_))) => {
                eprintln!();
                eprintln!("Built-in imagery covers 2008, 2012-2023.");
                eprintln!("Add a [service.<name>] section to config.ini for other years.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!(
                    "Check {} or pass --config <path>.",
                    geomosaic::config::config_file_path().display()
                );
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Mosaic(e) => write!(f, "Mosaic build failed: {}", e),
            CliError::ReadMosaic { path, error } => {
                write!(f, "Failed to read mosaic '{}': {}", path.display(), error)
            }
            CliError::Patches(e) => write!(f, "Patch extraction failed: {}", e),
            CliError::Labels(e) => write!(f, "Label fetch failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Mosaic(e) => Some(e),
            CliError::ReadMosaic { error, .. } => Some(error),
            CliError::Patches(e) => Some(e),
            CliError::Labels(e) => Some(e),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<MosaicError> for CliError {
    fn from(e: MosaicError) -> Self {
        CliError::Mosaic(e)
    }
}

impl From<PatchError> for CliError {
    fn from(e: PatchError) -> Self {
        CliError::Patches(e)
    }
}

impl From<LabelError> for CliError {
    fn from(e: LabelError) -> Self {
        CliError::Labels(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let config = CliError::Config(ConfigFileError::InvalidValue {
            section: "download".into(),
            key: "workers".into(),
            value: "many".into(),
            reason: "not a number".into(),
        });
        assert_eq!(config.exit_code(), 2);
        assert_eq!(CliError::LoggingInit("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_display_names_the_config_key() {
        let err = CliError::Config(ConfigFileError::InvalidValue {
            section: "download".into(),
            key: "workers".into(),
            value: "many".into(),
            reason: "not a number".into(),
        });
        let message = err.to_string();
        assert!(message.contains("download.workers"));
        assert!(message.contains("many"));
    }
}
