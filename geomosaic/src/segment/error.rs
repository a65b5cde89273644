use std::path::PathBuf;

use thiserror::Error;

use crate::raster::RasterError;

#[derive(Debug, Error)]
pub enum PatchError {
    /// Reading, writing or encoding one cell's patch failed.
    #[error("patch {id} failed: {source}")]
    PatchIoFailed {
        id: String,
        #[source]
        source: RasterError,
    },

    /// A cell id that cannot be used as a file name.
    #[error("cell id '{0}' is not a valid file name")]
    InvalidCellId(String),

    #[error("invalid patch size {width_m}x{height_m} m")]
    InvalidSize { width_m: f64, height_m: f64 },

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
