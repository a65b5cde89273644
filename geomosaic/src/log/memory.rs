//! Loggers that do not reach `tracing`.

use std::fmt::Arguments;

use parking_lot::Mutex;

use super::logger::{LogLevel, Logger};

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

/// Keeps formatted lines in memory, for tests and for summaries shown after
/// a batch finishes.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    min_level: Option<LogLevel>,
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep lines at `level` or above.
    pub fn with_min_level(level: LogLevel) -> Self {
        Self {
            min_level: Some(level),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.lock().iter().map(|(_, l)| l.clone()).collect()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries.lock().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        if self.min_level.is_some_and(|min| level < min) {
            return;
        }
        self.entries.lock().push((level, args.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_logger_as_trait_object() {
        let logger: Box<dyn Logger> = Box::new(NoOpLogger);
        logger.warn(format_args!("dropped"));
    }

    #[test]
    fn test_memory_logger_records_levels() {
        let logger = MemoryLogger::new();
        logger.info(format_args!("a {}", 1));
        logger.warn(format_args!("b"));
        assert_eq!(logger.lines(), vec!["a 1", "b"]);
        assert_eq!(logger.count(LogLevel::Warn), 1);
    }

    #[test]
    fn test_memory_logger_min_level() {
        let logger = MemoryLogger::with_min_level(LogLevel::Warn);
        logger.debug(format_args!("quiet"));
        logger.error(format_args!("loud"));
        assert_eq!(logger.entries(), vec![(LogLevel::Error, "loud".to_string())]);
    }
}
