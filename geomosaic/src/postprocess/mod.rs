//! Turning a filled canvas into the final mosaic file.
//!
//! The canvas is first persisted as `unprojected.tiff` inside the build's
//! scratch directory. Services that already deliver the working CRS at native
//! resolution then only need a rename; everything else is warped on the
//! blocking pool under a hard timeout; a warp that overruns it is cancelled
//! and awaited before the error is returned. The scratch directory belongs to the
//! caller, whose `TempDir` removes the intermediate on every exit path.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::PostprocessConfig;
use crate::geo::Crs;
use crate::log::Logger;
use crate::matrix::Delivery;
use crate::raster::{self, Raster, RasterError};
use crate::{log_debug, log_info, log_warn};

/// File name of the persisted canvas inside the scratch directory.
pub const INTERMEDIATE_NAME: &str = "unprojected.tiff";
const WARPED_NAME: &str = "warped.tiff";

#[derive(Debug, Error)]
pub enum PostprocessError {
    #[error("reprojection failed: {0}")]
    ReprojectFailed(String),

    #[error("reprojection exceeded {0:?}")]
    TimeoutExceeded(Duration),

    #[error("writing intermediate canvas failed: {0}")]
    Intermediate(#[source] RasterError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the final mosaic should look like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGrid {
    pub crs: Crs,
    /// Ground size of one output pixel, in target CRS units
    pub pixel_size: f64,
}

pub struct RasterPostprocessor {
    config: PostprocessConfig,
    logger: Arc<dyn Logger>,
}

impl RasterPostprocessor {
    pub fn new(config: PostprocessConfig, logger: Arc<dyn Logger>) -> Self {
        Self { config, logger }
    }

    /// Persist `canvas` in `scratch` and move or warp it to `output`.
    pub async fn finalize(
        &self,
        canvas: Raster,
        scratch: &Path,
        grid: OutputGrid,
        delivery: Delivery,
        output: &Path,
    ) -> Result<PathBuf, PostprocessError> {
        let intermediate = scratch.join(INTERMEDIATE_NAME);
        let rename = delivery == Delivery::Rename && canvas.crs() == grid.crs;

        if rename {
            let native = canvas.transform().pixel_width;
            if (native - grid.pixel_size).abs() > 1e-9 {
                log_warn!(
                    self.logger,
                    "keeping native resolution {} instead of {} for renamed delivery",
                    native,
                    grid.pixel_size
                );
            }
            write_blocking(canvas, intermediate.clone()).await?;
            tokio::fs::rename(&intermediate, output).await?;
            log_info!(self.logger, "mosaic written to {}", output.display());
            return Ok(output.to_path_buf());
        }

        let warped = scratch.join(WARPED_NAME);
        let resampling = self.config.resampling();
        let limit = self.config.warp_timeout();
        log_debug!(
            self.logger,
            "warping {}x{} canvas from {} to {} at {} ({})",
            canvas.width(),
            canvas.height(),
            canvas.crs(),
            grid.crs,
            grid.pixel_size,
            resampling
        );

        let cancel = Arc::new(AtomicBool::new(false));
        let mut job = tokio::task::spawn_blocking({
            let intermediate = intermediate.clone();
            let warped = warped.clone();
            let cancel = Arc::clone(&cancel);
            move || -> Result<(), PostprocessError> {
                raster::write_geotiff(&canvas, &intermediate, None)
                    .map_err(PostprocessError::Intermediate)?;
                let out = raster::warp_cancellable(
                    &canvas,
                    grid.crs,
                    grid.pixel_size,
                    resampling,
                    &cancel,
                )
                .map_err(|e| PostprocessError::ReprojectFailed(e.to_string()))?;
                if cancel.load(Ordering::Relaxed) {
                    return Err(PostprocessError::ReprojectFailed("cancelled".into()));
                }
                raster::write_geotiff(&out, &warped, None)
                    .map_err(|e| PostprocessError::ReprojectFailed(e.to_string()))
            }
        });

        match tokio::time::timeout(limit, &mut job).await {
            Err(_) => {
                // The job must be gone before the caller drops the scratch dir.
                cancel.store(true, Ordering::Relaxed);
                let _ = job.await;
                remove_if_present(&warped).await;
                log_warn!(self.logger, "warp cancelled after {:?}", limit);
                return Err(PostprocessError::TimeoutExceeded(limit));
            }
            Ok(Err(join)) => return Err(PostprocessError::ReprojectFailed(join.to_string())),
            Ok(Ok(result)) => result?,
        }

        tokio::fs::rename(&warped, output).await?;
        log_info!(self.logger, "mosaic warped to {}", output.display());
        Ok(output.to_path_buf())
    }
}

async fn write_blocking(canvas: Raster, path: PathBuf) -> Result<(), PostprocessError> {
    tokio::task::spawn_blocking(move || raster::write_geotiff(&canvas, &path, None))
        .await
        .map_err(|e| PostprocessError::Io(std::io::Error::other(e)))?
        .map_err(PostprocessError::Intermediate)
}

async fn remove_if_present(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "could not remove partial warp output");
        }
    }
}
