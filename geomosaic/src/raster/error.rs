//! Raster I/O errors.

use thiserror::Error;

use crate::geo::CrsError;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported raster: {0}")]
    Unsupported(String),

    #[error("missing or invalid georeferencing: {0}")]
    Georeference(String),

    #[error(transparent)]
    Projection(#[from] CrsError),

    #[error("buffer of {len} bytes does not match {width}x{height} RGB")]
    InvalidDimensions { width: u32, height: u32, len: usize },

    #[error("warp cancelled")]
    Cancelled,

    #[error("window {width}x{height} at ({x}, {y}) lies outside the raster")]
    WindowOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}
