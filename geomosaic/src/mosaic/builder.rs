//! Drives one mosaic build from year and bounding box to a finished file.

use std::path::PathBuf;
use std::sync::Arc;

use super::{MosaicError, MosaicRequest};
use crate::config::{FetchConfig, PostprocessConfig};
use crate::fetch::{FetchReport, TileFetcher, Timer};
use crate::log::{Logger, ScopedLogger};
use crate::matrix::{CapabilitiesSource, TileMatrixResolver};
use crate::plan::plan;
use crate::postprocess::{OutputGrid, RasterPostprocessor};
use crate::provider::TileSourceFactory;
use crate::{log_debug, log_info};

/// Result of [`MosaicBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub enum MosaicOutcome {
    /// A new mosaic was written.
    Built { path: PathBuf, report: FetchReport },
    /// The output already existed and the request was not forced.
    AlreadyExists(PathBuf),
}

impl MosaicOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            MosaicOutcome::Built { path, .. } | MosaicOutcome::AlreadyExists(path) => path,
        }
    }
}

/// Resolve → plan → fetch → finalize, strictly in that order, for one
/// `(city, year)` at a time.
///
/// Each build gets its own scratch directory and a logger scoped to its
/// `city/year` label, so several builders can run side by side as long as
/// their requests name different outputs.
pub struct MosaicBuilder<C, F, T> {
    resolver: TileMatrixResolver<C>,
    sources: F,
    timer: Arc<T>,
    fetch: FetchConfig,
    postprocess: PostprocessConfig,
    logger: Arc<dyn Logger>,
}

impl<C, F, T> MosaicBuilder<C, F, T>
where
    C: CapabilitiesSource,
    F: TileSourceFactory,
    T: Timer,
{
    pub fn new(
        resolver: TileMatrixResolver<C>,
        sources: F,
        timer: Arc<T>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            resolver,
            sources,
            timer,
            fetch: FetchConfig::default(),
            postprocess: PostprocessConfig::default(),
            logger,
        }
    }

    pub fn with_fetch_config(mut self, config: FetchConfig) -> Self {
        self.fetch = config;
        self
    }

    pub fn with_postprocess_config(mut self, config: PostprocessConfig) -> Self {
        self.postprocess = config;
        self
    }

    pub fn resolver(&self) -> &TileMatrixResolver<C> {
        &self.resolver
    }

    pub async fn build(&self, request: &MosaicRequest) -> Result<MosaicOutcome, MosaicError> {
        request.validate()?;
        let logger: Arc<dyn Logger> =
            Arc::new(ScopedLogger::new(Arc::clone(&self.logger), request.label()));

        let output = request.output_path();
        if output.exists() && !request.force {
            log_info!(logger, "{} exists, skipping", output.display());
            return Ok(MosaicOutcome::AlreadyExists(output));
        }

        let matrix = self
            .resolver
            .resolve(request.year, request.pixel_size)
            .await?;
        log_info!(
            logger,
            "layer {} matrix {}/{} ({} m tile pixels)",
            matrix.layer_name,
            matrix.tile_matrix_set,
            matrix.zoom_level,
            matrix.tile_pixel_size()
        );

        let bbox = request.bbox.reproject(request.bbox_crs, matrix.crs)?;
        let plan = plan(&bbox, &matrix, request.padding, request.pixel_size)?;
        log_debug!(
            logger,
            "planned {} tiles, canvas {}x{}",
            plan.tile_count(),
            plan.canvas_width,
            plan.canvas_height
        );

        let year_dir = request.year_dir();
        tokio::fs::create_dir_all(&year_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!(".geomosaic-{}-", request.city))
            .tempdir_in(&year_dir)?;

        let source = Arc::new(self.sources.create(&matrix));
        let fetcher = TileFetcher::new(source, Arc::clone(&self.timer), self.fetch, Arc::clone(&logger));
        let fetched = fetcher.fetch(&plan, &matrix).await?;

        let postprocessor = RasterPostprocessor::new(self.postprocess, Arc::clone(&logger));
        let grid = OutputGrid {
            crs: request.target_crs,
            pixel_size: request.pixel_size,
        };
        let path = postprocessor
            .finalize(
                fetched.canvas.into_raster(),
                scratch.path(),
                grid,
                matrix.delivery,
                &output,
            )
            .await?;

        scratch.close()?;
        Ok(MosaicOutcome::Built {
            path,
            report: fetched.report,
        })
    }
}
