//! Injected logging capability.
//!
//! Library components never log through global state of their own. They take
//! an `Arc<dyn Logger>` and write through the `log_*!` macros; the binary
//! decides where lines go. One mosaic build gets a [`ScopedLogger`] carrying
//! its `city/year` label, so two builds running side by side stay readable.
//!
//! ```
//! use geomosaic::log::{Logger, MemoryLogger, ScopedLogger};
//! use geomosaic::log_warn;
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemoryLogger::new());
//! let logger: Arc<dyn Logger> = Arc::new(ScopedLogger::new(sink.clone(), "utrecht/2020"));
//! log_warn!(logger, "tile {} failed", 7);
//! assert_eq!(sink.lines(), vec!["[utrecht/2020] tile 7 failed".to_string()]);
//! ```

mod logger;
mod memory;
mod scoped;
mod tracing_adapter;

pub use logger::{LogLevel, Logger};
pub use memory::{MemoryLogger, NoOpLogger};
pub use scoped::ScopedLogger;
pub use tracing_adapter::TracingLogger;
