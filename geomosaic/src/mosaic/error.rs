//! Fatal errors of one mosaic build.

use std::time::Duration;

use thiserror::Error;

use crate::fetch::FetchError;
use crate::geo::CrsError;
use crate::matrix::MatrixError;
use crate::plan::PlanError;
use crate::postprocess::PostprocessError;
use crate::raster::RasterError;

/// Anything that aborts a build. Individual tile failures are not here; they
/// end up in the [`FetchReport`](crate::fetch::FetchReport).
#[derive(Debug, Error)]
pub enum MosaicError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error("bounding box reprojection failed: {0}")]
    Projection(#[from] CrsError),

    #[error("cannot plan tiles: {0}")]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("reprojection failed: {0}")]
    ReprojectFailed(String),

    #[error("reprojection exceeded its {0:?} budget")]
    TimeoutExceeded(Duration),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid mosaic request: {0}")]
    InvalidRequest(String),
}

impl From<PostprocessError> for MosaicError {
    fn from(err: PostprocessError) -> Self {
        match err {
            PostprocessError::ReprojectFailed(reason) => MosaicError::ReprojectFailed(reason),
            PostprocessError::TimeoutExceeded(limit) => MosaicError::TimeoutExceeded(limit),
            PostprocessError::Intermediate(e) => MosaicError::Raster(e),
            PostprocessError::Io(e) => MosaicError::Io(e),
        }
    }
}
