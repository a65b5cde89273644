//! Tracing library adapter implementation.

use super::logger::{LogLevel, Logger};
use std::fmt::Arguments;

/// Forwards to the `tracing` macros, so lines reach whatever subscriber the
/// binary installed (see [`crate::logging::init_logging`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!("{}", args),
            LogLevel::Debug => tracing::debug!("{}", args),
            LogLevel::Info => tracing::info!("{}", args),
            LogLevel::Warn => tracing::warn!("{}", args),
            LogLevel::Error => tracing::error!("{}", args),
        }
    }
}
