//! Per-build logger.

use std::fmt::Arguments;
use std::sync::Arc;

use super::logger::{LogLevel, Logger};

/// Prefixes every line with a scope label such as `utrecht/2020`.
///
/// Scopes nest: `ScopedLogger::new(parent, "patches")` on top of a build
/// logger yields `[utrecht/2020] [patches] ...`.
pub struct ScopedLogger {
    inner: Arc<dyn Logger>,
    scope: String,
}

impl ScopedLogger {
    pub fn new(inner: Arc<dyn Logger>, scope: impl Into<String>) -> Self {
        Self {
            inner,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl Logger for ScopedLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.inner
            .log(level, format_args!("[{}] {}", self.scope, args));
    }
}
