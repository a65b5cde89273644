//! Logging infrastructure for geomosaic.
//!
//! Sets up the global `tracing` subscriber for the binary:
//! - Writes to the configured log file (cleared on session start)
//! - Optionally mirrors to stdout
//! - Configurable via RUST_LOG environment variable
//!
//! Library components never call this; they log through an injected
//! [`Logger`](crate::log::Logger).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub stdout: bool,
    /// Filter used when RUST_LOG is not set
    pub default_filter: String,
}

impl LoggingConfig {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            stdout: true,
            default_filter: "info".to_string(),
        }
    }

    pub fn with_stdout(mut self, stdout: bool) -> Self {
        self.stdout = stdout;
        self
    }

    /// Log debug lines from geomosaic itself, info from everything else.
    pub fn verbose(mut self) -> Self {
        self.default_filter = "info,geomosaic=debug".to_string();
        self
    }
}

/// Initialize the logging system.
///
/// Creates the log directory if needed, clears the previous log file and
/// installs the global subscriber. Fails if a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, io::Error> {
    let (log_dir, log_file) = split_log_path(&config.file)?;
    fs::create_dir_all(&log_dir)?;
    fs::write(config.file.as_path(), "")?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = config.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .compact()
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), io::Error> {
    let file = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path {} has no file name", path.display()),
        )
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(file)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, file) = split_log_path(Path::new("/var/log/geomosaic/run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/geomosaic"));
        assert_eq!(file, PathBuf::from("run.log"));

        let (dir, file) = split_log_path(Path::new("run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(file, PathBuf::from("run.log"));

        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_verbose_filter() {
        let config = LoggingConfig::new("x.log").verbose().with_stdout(false);
        assert_eq!(config.default_filter, "info,geomosaic=debug");
        assert!(!config.stdout);
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }

    // Installing the subscriber is process-global and tested through the CLI.
}
