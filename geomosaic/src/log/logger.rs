//! Logger trait and formatting macros.

use std::fmt::Arguments;

/// Severity of a log line, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-tile and per-attempt detail
    Trace,
    /// Planning and warp parameters
    Debug,
    /// One line per finished stage
    Info,
    /// Recoverable problems: a blank tile, a skipped patch
    Warn,
    /// The build or batch could not finish
    Error,
}

/// Sink for log lines written by pipeline components.
///
/// Builders, fetchers and segmenters hold an `Arc<dyn Logger>` instead of
/// calling `tracing` directly, so tests can capture output with
/// [`MemoryLogger`](super::MemoryLogger) and the CLI can route it through
/// [`TracingLogger`](super::TracingLogger).
///
/// # Thread Safety
///
/// Tile jobs run on the tokio pool and warps on the blocking pool, both
/// sharing one logger. Implementations must be `Send + Sync`.
///
/// # Example
///
/// ```
/// use geomosaic::log::{LogLevel, Logger, MemoryLogger};
/// use geomosaic::{log_debug, log_info};
/// use std::sync::Arc;
///
/// let sink = Arc::new(MemoryLogger::new());
/// let logger: Arc<dyn Logger> = sink.clone();
/// log_debug!(logger, "planned {} tiles", 16);
/// log_info!(logger, "mosaic written");
/// assert_eq!(sink.count(LogLevel::Info), 1);
/// ```
pub trait Logger: Send + Sync {
    /// Write one line at `level`.
    ///
    /// The only required method. The per-level helpers below forward here.
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

/// Format-string shorthands for the [`Logger`] methods, e.g.
/// `log_warn!(logger, "tile {} failed", tile)`.
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    struct Counting(parking_lot::Mutex<Vec<LogLevel>>);

    impl Logger for Counting {
        fn log(&self, level: LogLevel, _args: Arguments<'_>) {
            self.0.lock().push(level);
        }
    }

    #[test]
    fn test_level_helpers_forward_to_log() {
        let logger = Counting(parking_lot::Mutex::new(Vec::new()));
        log_trace!(logger, "a");
        log_debug!(logger, "b");
        log_info!(logger, "c");
        log_warn!(logger, "d {}", 1);
        log_error!(logger, "e");
        assert_eq!(
            *logger.0.lock(),
            vec![
                LogLevel::Trace,
                LogLevel::Debug,
                LogLevel::Info,
                LogLevel::Warn,
                LogLevel::Error
            ]
        );
    }
}
