//! Concurrent tile fetching.
//!
//! [`TileFetcher`] downloads every tile of a [`FetchPlan`](crate::plan::FetchPlan)
//! through a bounded pool of workers and writes each decoded tile into its own
//! window of a shared [`Canvas`]. A tile that keeps failing is retried under a
//! [`RetryPolicy`] and, once the policy gives up, left zero-filled: a missing
//! tile degrades the mosaic but never aborts it.
//!
//! Sleeping goes through the [`Timer`] trait so tests can run the full retry
//! schedule against a [`RecordingTimer`] without waiting.

mod canvas;
mod fetcher;
mod retry;

pub use canvas::{Canvas, CanvasError};
pub use fetcher::{FetchError, FetchReport, FetchedCanvas, TileFailure, TileFetcher};
pub use retry::{RecordingTimer, RetryExhausted, RetryPolicy, Timer, TokioTimer};
