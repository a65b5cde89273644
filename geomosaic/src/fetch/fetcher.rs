//! Bounded-concurrency tile download into a [`Canvas`].

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::canvas::{decode_tile, Canvas};
use super::retry::Timer;
use crate::config::FetchConfig;
use crate::log::Logger;
use crate::matrix::TileMatrixDescriptor;
use crate::plan::{FetchPlan, PixelWindow, TileIndex};
use crate::provider::{SourceError, TileSource};
use crate::{log_debug, log_info, log_warn};

/// Errors that stop a fetch as a whole. Individual tile failures never do;
/// they are collected in [`FetchReport::failed`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch worker failed: {0}")]
    Internal(String),
}

/// A tile that stayed zero-filled after the retry policy gave up.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFailure {
    pub tile: TileIndex,
    pub attempts: u32,
    pub error: SourceError,
}

/// Outcome counts of one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    /// Tiles in the plan
    pub planned: usize,
    /// Tiles downloaded and written
    pub fetched: usize,
    /// Tiles outside the advertised matrix, never requested
    pub skipped: usize,
    pub failed: Vec<TileFailure>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A filled canvas and how it got that way.
pub struct FetchedCanvas {
    pub canvas: Canvas,
    pub report: FetchReport,
}

enum TileOutcome {
    Fetched,
    Failed(TileFailure),
}

/// Downloads every tile of a plan through at most `workers` concurrent
/// requests and writes each into its window of a shared canvas.
pub struct TileFetcher<S, T> {
    source: Arc<S>,
    timer: Arc<T>,
    config: FetchConfig,
    logger: Arc<dyn Logger>,
}

impl<S, T> TileFetcher<S, T>
where
    S: TileSource + 'static,
    T: Timer,
{
    pub fn new(source: Arc<S>, timer: Arc<T>, config: FetchConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            source,
            timer,
            config,
            logger,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch all tiles of `plan`. Tiles the matrix does not contain are
    /// skipped and stay zero.
    pub async fn fetch(
        &self,
        plan: &FetchPlan,
        matrix: &TileMatrixDescriptor,
    ) -> Result<FetchedCanvas, FetchError> {
        let canvas = Arc::new(Canvas::for_plan(plan));
        let permits = Arc::new(Semaphore::new(self.config.workers()));
        let mut report = FetchReport {
            planned: plan.tile_count(),
            ..FetchReport::default()
        };

        log_info!(
            self.logger,
            "fetching {} tiles from {} (rows {}..{}, cols {}..{}) with {} workers",
            report.planned,
            self.source.name(),
            plan.min_row,
            plan.max_row,
            plan.min_col,
            plan.max_col,
            self.config.workers()
        );

        let mut tasks = JoinSet::new();
        for tile in plan.tiles() {
            let Some(window) = plan.window(tile) else {
                continue;
            };
            if !matrix.contains_tile(tile.row, tile.col) {
                log_debug!(self.logger, "tile {} outside the tile matrix, skipped", tile);
                report.skipped += 1;
                continue;
            }

            let job = TileJob {
                source: Arc::clone(&self.source),
                timer: Arc::clone(&self.timer),
                canvas: Arc::clone(&canvas),
                logger: Arc::clone(&self.logger),
                config: self.config,
                tile,
                window,
            };
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| FetchError::Internal(e.to_string()))?;
                Ok::<_, FetchError>(job.run().await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| FetchError::Internal(e.to_string()))??;
            match outcome {
                TileOutcome::Fetched => report.fetched += 1,
                TileOutcome::Failed(failure) => report.failed.push(failure),
            }
        }
        report.failed.sort_by_key(|f| (f.tile.row, f.tile.col));

        if report.is_complete() {
            log_info!(
                self.logger,
                "fetched {} tiles ({} skipped)",
                report.fetched,
                report.skipped
            );
        } else {
            log_warn!(
                self.logger,
                "fetched {} tiles, {} left blank after retries ({} skipped)",
                report.fetched,
                report.failed.len(),
                report.skipped
            );
        }

        let canvas = Arc::try_unwrap(canvas)
            .map_err(|_| FetchError::Internal("canvas still shared after all workers finished".into()))?;
        Ok(FetchedCanvas { canvas, report })
    }
}

/// Everything one spawned tile download needs.
struct TileJob<S, T> {
    source: Arc<S>,
    timer: Arc<T>,
    canvas: Arc<Canvas>,
    logger: Arc<dyn Logger>,
    config: FetchConfig,
    tile: TileIndex,
    window: PixelWindow,
}

impl<S, T> TileJob<S, T>
where
    S: TileSource,
    T: Timer,
{
    async fn run(self) -> TileOutcome {
        let tile = self.tile;
        let request_timeout = self.config.request_timeout();
        let source = &self.source;
        let logger = &self.logger;

        let result = self
            .config
            .retry()
            .run(
                self.timer.as_ref(),
                |_| async move {
                    let bytes = tokio::time::timeout(request_timeout, source.get_tile(tile))
                        .await
                        .map_err(|_| SourceError::Timeout)??;
                    decode_tile(&bytes).map_err(|e| SourceError::InvalidResponse(e.to_string()))
                },
                |attempt, error, next| match next {
                    Some(delay) => log_warn!(
                        logger,
                        "tile {} attempt {} failed: {}; retrying in {:?}",
                        tile,
                        attempt,
                        error,
                        delay
                    ),
                    None => log_warn!(
                        logger,
                        "tile {} failed after {} attempts: {}",
                        tile,
                        attempt,
                        error
                    ),
                },
            )
            .await;

        let image = match result {
            Ok(image) => image,
            Err(exhausted) => {
                return TileOutcome::Failed(TileFailure {
                    tile,
                    attempts: exhausted.attempts,
                    error: exhausted.last_error,
                })
            }
        };

        if let Err(e) = self.canvas.write_window(self.window, &image) {
            log_warn!(self.logger, "tile {} not written: {}", tile, e);
            return TileOutcome::Failed(TileFailure {
                tile,
                attempts: 1,
                error: SourceError::InvalidResponse(e.to_string()),
            });
        }
        log_debug!(self.logger, "tile {} written", tile);

        if !self.config.pacing().is_zero() {
            self.timer.sleep(self.config.pacing()).await;
        }
        TileOutcome::Fetched
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::fetch::RecordingTimer;
    use crate::geo::{GeoTransform, RD_NEW};
    use crate::log::{LogLevel, MemoryLogger};
    use crate::matrix::types::fixtures::one_metre_descriptor;
    use std::time::Duration;

    fn small_plan() -> FetchPlan {
        FetchPlan {
            min_row: 10,
            max_row: 12,
            min_col: 20,
            max_col: 23,
            tile_width: 256,
            tile_height: 256,
            canvas_width: 3 * 256,
            canvas_height: 2 * 256,
            transform: GeoTransform::new(-280_281.92, 900_841.92, 1.0, -1.0),
            crs: RD_NEW,
        }
    }

    fn fetcher(
        source: Arc<FakeSource>,
        timer: Arc<RecordingTimer>,
        logger: Arc<MemoryLogger>,
    ) -> TileFetcher<FakeSource, RecordingTimer> {
        TileFetcher::new(source, timer, FetchConfig::default(), logger)
    }

    #[tokio::test]
    async fn test_every_tile_lands_in_its_window() {
        let source = Arc::new(FakeSource::new(256));
        let timer = Arc::new(RecordingTimer::new());
        let logger = Arc::new(MemoryLogger::new());
        let plan = small_plan();

        let fetched = fetcher(source.clone(), timer.clone(), logger)
            .fetch(&plan, &one_metre_descriptor())
            .await
            .unwrap();

        assert_eq!(fetched.report.planned, 6);
        assert_eq!(fetched.report.fetched, 6);
        assert!(fetched.report.is_complete());
        for tile in plan.tiles() {
            let w = plan.window(tile).unwrap();
            let colour = tile_colour(tile);
            assert_eq!(fetched.canvas.pixel(w.x, w.y), Some(colour));
            assert_eq!(
                fetched.canvas.pixel(w.x + w.width - 1, w.y + w.height - 1),
                Some(colour)
            );
        }
        // Only pacing pauses, one per tile
        assert_eq!(timer.sleeps(), vec![Duration::from_millis(25); 6]);
    }

    #[tokio::test]
    async fn test_failing_tile_is_tried_eleven_times_and_left_blank() {
        let broken = TileIndex::new(11, 21);
        let source = Arc::new(FakeSource::new(256).with_broken(broken));
        let timer = Arc::new(RecordingTimer::new());
        let logger = Arc::new(MemoryLogger::new());
        let plan = small_plan();

        let fetched = fetcher(source.clone(), timer.clone(), logger.clone())
            .fetch(&plan, &one_metre_descriptor())
            .await
            .unwrap();

        assert_eq!(source.calls(broken), 11);
        assert_eq!(fetched.report.fetched, 5);
        assert_eq!(fetched.report.failed.len(), 1);
        assert_eq!(fetched.report.failed[0].tile, broken);
        assert_eq!(fetched.report.failed[0].attempts, 11);

        let w = plan.window(broken).unwrap();
        assert_eq!(fetched.canvas.pixel(w.x, w.y), Some([0, 0, 0]));
        assert_eq!(fetched.canvas.pixel(w.x + 255, w.y + 255), Some([0, 0, 0]));
        let left = plan.window(TileIndex::new(11, 20)).unwrap();
        assert_eq!(
            fetched.canvas.pixel(left.x, left.y),
            Some(tile_colour(TileIndex::new(11, 20)))
        );

        // 10 backoff pauses for the broken tile
        let backoff: Vec<_> = timer
            .sleeps()
            .into_iter()
            .filter(|d| *d >= Duration::from_secs(1))
            .collect();
        assert_eq!(backoff.len(), 10);
        assert_eq!(logger.count(LogLevel::Warn), 12);
    }

    #[tokio::test]
    async fn test_tiles_outside_matrix_are_skipped() {
        let source = Arc::new(FakeSource::new(256));
        let timer = Arc::new(RecordingTimer::new());
        let logger = Arc::new(MemoryLogger::new());
        let plan = small_plan();
        let mut matrix = one_metre_descriptor();
        matrix.geometry.matrix_width = Some(22);

        let fetched = fetcher(source.clone(), timer, logger)
            .fetch(&plan, &matrix)
            .await
            .unwrap();

        assert_eq!(fetched.report.skipped, 2);
        assert_eq!(fetched.report.fetched, 4);
        assert_eq!(source.calls(TileIndex::new(10, 22)), 0);
        let w = plan.window(TileIndex::new(10, 22)).unwrap();
        assert_eq!(fetched.canvas.pixel(w.x, w.y), Some([0, 0, 0]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_never_exceeds_workers() {
        let source = Arc::new(FakeSource::new(256));
        let timer = Arc::new(RecordingTimer::new());
        let config = FetchConfig::default().with_workers(2);
        let fetcher = TileFetcher::new(
            source.clone(),
            timer,
            config,
            Arc::new(MemoryLogger::new()),
        );

        let fetched = fetcher
            .fetch(&small_plan(), &one_metre_descriptor())
            .await
            .unwrap();

        assert_eq!(fetched.report.fetched, 6);
        assert_eq!(source.total_calls(), 6);
        assert!(source.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_retried() {
        struct Garbage;
        impl TileSource for Garbage {
            async fn get_tile(&self, _tile: TileIndex) -> Result<Vec<u8>, SourceError> {
                Ok(b"<html>not an image</html>".to_vec())
            }
            fn name(&self) -> &str {
                "garbage"
            }
        }

        let mut plan = small_plan();
        plan.max_row = 11;
        plan.max_col = 21;
        plan.canvas_width = 256;
        plan.canvas_height = 256;
        let config = FetchConfig::default().with_retry(crate::fetch::RetryPolicy::new().with_max_retries(2));
        let fetcher = TileFetcher::new(
            Arc::new(Garbage),
            Arc::new(RecordingTimer::new()),
            config,
            Arc::new(MemoryLogger::new()),
        );

        let fetched = fetcher.fetch(&plan, &one_metre_descriptor()).await.unwrap();
        assert_eq!(fetched.report.failed.len(), 1);
        assert_eq!(fetched.report.failed[0].attempts, 3);
        assert!(matches!(
            fetched.report.failed[0].error,
            SourceError::InvalidResponse(_)
        ));
    }
}
