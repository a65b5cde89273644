//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and the tokio runtime
//! so command handlers only deal with their own work.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::info;

use geomosaic::config::{config_file_path, ConfigFile};
use geomosaic::log::{Logger, TracingLogger};
use geomosaic::logging::{init_logging, LoggingConfig, LoggingGuard};
use geomosaic::provider::AsyncReqwestClient;

use crate::error::CliError;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Config file to load instead of ~/.geomosaic/config.ini
    pub config: Option<PathBuf>,
    /// Debug-level logging for geomosaic
    pub verbose: bool,
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    runtime: Runtime,
}

impl CliRunner {
    /// Load config, initialize logging and start the runtime.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let path = options.config.clone().unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&path)?;

        let mut logging = LoggingConfig::new(config.logging.file.clone())
            .with_stdout(config.logging.stdout);
        if options.verbose {
            logging = logging.verbose();
        }
        let logging_guard =
            init_logging(&logging).map_err(|e| CliError::LoggingInit(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;

        info!("Using config {}", path.display());

        Ok(Self {
            logging_guard,
            config,
            runtime,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("geomosaic v{}", geomosaic::VERSION);
        info!("geomosaic CLI: {} command", command);
    }

    /// Library logging delegated to the tracing subscriber.
    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::new(TracingLogger)
    }

    /// Shared HTTP client with the configured per-request timeout.
    pub fn http_client(&self, timeout: Duration) -> Result<Arc<AsyncReqwestClient>, CliError> {
        let _entered = self.runtime.enter();
        AsyncReqwestClient::with_timeout(timeout)
            .map(Arc::new)
            .map_err(CliError::HttpClient)
    }

    /// Drive a future to completion on the runner's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
