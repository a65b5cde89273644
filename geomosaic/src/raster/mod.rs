//! In-memory RGB rasters and their on-disk GeoTIFF form.

mod error;
mod geotiff;
mod warp;

pub use error::RasterError;
pub use geotiff::{decode_geotiff, encode_geotiff, read_geotiff, write_geotiff};
pub use warp::{warp, warp_cancellable, Resampling};

use crate::geo::{Crs, GeoTransform};

const CHANNELS: usize = 3;

/// A georeferenced 3-band, 8-bit raster held in memory, pixel-interleaved,
/// rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
    transform: GeoTransform,
    crs: Crs,
}

impl Raster {
    /// Wrap an RGB buffer, checking its length against the dimensions.
    pub fn new(
        width: u32,
        height: u32,
        data: Vec<u8>,
        transform: GeoTransform,
        crs: Crs,
    ) -> Result<Self, RasterError> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(RasterError::InvalidDimensions {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self::from_parts(width, height, data, transform, crs))
    }

    pub(crate) fn from_parts(
        width: u32,
        height: u32,
        data: Vec<u8>,
        transform: GeoTransform,
        crs: Crs,
    ) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * CHANNELS);
        Self {
            width,
            height,
            data,
            transform,
            crs,
        }
    }

    /// All-zero raster.
    pub fn blank(width: u32, height: u32, transform: GeoTransform, crs: Crs) -> Self {
        let data = vec![0u8; width as usize * height as usize * CHANNELS];
        Self::from_parts(width, height, data, transform, crs)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// `(min_x, min_y, max_x, max_y)` in map units.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Copy out a `width × height` window starting at pixel `(x, y)`, with
    /// its transform shifted to the window's corner.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Raster, RasterError> {
        let fits_x = x.checked_add(width).is_some_and(|r| r <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|b| b <= self.height);
        if !(fits_x && fits_y) {
            return Err(RasterError::WindowOutOfBounds {
                x,
                y,
                width,
                height,
            });
        }

        let row_bytes = self.width as usize * CHANNELS;
        let out_row_bytes = width as usize * CHANNELS;
        let mut data = Vec::with_capacity(out_row_bytes * height as usize);
        for row in y..y + height {
            let start = row as usize * row_bytes + x as usize * CHANNELS;
            data.extend_from_slice(&self.data[start..start + out_row_bytes]);
        }

        Ok(Self::from_parts(
            width,
            height,
            data,
            self.transform.shifted(x as i64, y as i64),
            self.crs,
        ))
    }
}
