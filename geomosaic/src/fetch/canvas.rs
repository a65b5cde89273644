//! Shared write target for concurrently fetched tiles.

use image::RgbImage;
use parking_lot::Mutex;
use thiserror::Error;

use crate::geo::{Crs, GeoTransform};
use crate::plan::{FetchPlan, PixelWindow};
use crate::raster::Raster;

const CHANNELS: usize = 3;

/// Errors from writing into a [`Canvas`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanvasError {
    #[error("window {window:?} exceeds canvas of {width}x{height}")]
    WindowOutOfBounds {
        window: PixelWindow,
        width: u32,
        height: u32,
    },

    #[error("tile decode failed: {0}")]
    Decode(String),
}

/// Zero-initialised RGB buffer split into horizontal strips, one lock each.
///
/// Strips are as tall as a tile row, so writers of tiles in different rows
/// never contend and writers in the same row hold the lock only for the copy.
pub struct Canvas {
    width: u32,
    height: u32,
    strip_height: u32,
    strips: Vec<Mutex<Vec<u8>>>,
    transform: GeoTransform,
    crs: Crs,
}

impl Canvas {
    pub fn new(
        width: u32,
        height: u32,
        strip_height: u32,
        transform: GeoTransform,
        crs: Crs,
    ) -> Self {
        let strip_height = strip_height.clamp(1, height.max(1));
        let row_bytes = width as usize * CHANNELS;
        let strips = (0..height)
            .step_by(strip_height as usize)
            .map(|top| {
                let rows = strip_height.min(height - top) as usize;
                Mutex::new(vec![0u8; rows * row_bytes])
            })
            .collect();

        Self {
            width,
            height,
            strip_height,
            strips,
            transform,
            crs,
        }
    }

    /// A canvas sized for `plan`, with one strip per tile row.
    pub fn for_plan(plan: &FetchPlan) -> Self {
        Self::new(
            plan.canvas_width,
            plan.canvas_height,
            plan.tile_height,
            plan.transform,
            plan.crs,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Copy `tile` into `window`, cropping a tile larger than the window.
    /// A smaller tile leaves the rest of the window untouched.
    ///
    /// The bounds check happens before any byte is written.
    pub fn write_window(&self, window: PixelWindow, tile: &RgbImage) -> Result<(), CanvasError> {
        let fits_x = window.x.checked_add(window.width).is_some_and(|r| r <= self.width);
        let fits_y = window.y.checked_add(window.height).is_some_and(|b| b <= self.height);
        if !(fits_x && fits_y) {
            return Err(CanvasError::WindowOutOfBounds {
                window,
                width: self.width,
                height: self.height,
            });
        }

        let copy_w = window.width.min(tile.width()) as usize;
        let copy_h = window.height.min(tile.height());
        let canvas_row_bytes = self.width as usize * CHANNELS;
        let tile_row_bytes = tile.width() as usize * CHANNELS;
        let src = tile.as_raw();

        let mut y = 0;
        while y < copy_h {
            let canvas_row = window.y + y;
            let strip_index = (canvas_row / self.strip_height) as usize;
            let strip_top = strip_index as u32 * self.strip_height;
            let rows_here = (strip_top + self.strip_height - canvas_row).min(copy_h - y);

            let mut strip = self.strips[strip_index].lock();
            for r in 0..rows_here {
                let src_start = (y + r) as usize * tile_row_bytes;
                let dst_start = (canvas_row + r - strip_top) as usize * canvas_row_bytes
                    + window.x as usize * CHANNELS;
                strip[dst_start..dst_start + copy_w * CHANNELS]
                    .copy_from_slice(&src[src_start..src_start + copy_w * CHANNELS]);
            }
            drop(strip);

            y += rows_here;
        }
        Ok(())
    }

    /// RGB value at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let strip = self.strips[(y / self.strip_height) as usize].lock();
        let offset = ((y % self.strip_height) as usize * self.width as usize + x as usize) * CHANNELS;
        Some([strip[offset], strip[offset + 1], strip[offset + 2]])
    }

    /// Stitch the strips into one contiguous raster.
    pub fn into_raster(self) -> Raster {
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * CHANNELS);
        for strip in self.strips {
            data.extend_from_slice(&strip.into_inner());
        }
        Raster::from_parts(self.width, self.height, data, self.transform, self.crs)
    }
}

/// Decode an encoded tile (JPEG or PNG) into RGB.
pub(crate) fn decode_tile(bytes: &[u8]) -> Result<RgbImage, CanvasError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| CanvasError::Decode(e.to_string()))
}
