//! Reprojection and resampling of a raster onto a north-up grid.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use super::{Raster, RasterError, CHANNELS};
use crate::geo::{BoundingBox, Crs, GeoTransform, Reprojector};

/// Spacing in output pixels between exactly projected control points.
/// Pixels in between interpolate source coordinates linearly.
const CONTROL_STEP: u32 = 16;

/// Upper bound on warped output size, in pixels.
const MAX_OUTPUT_PIXELS: u64 = 1 << 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resampling {
    Nearest,
    #[default]
    Bilinear,
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resampling::Nearest => write!(f, "nearest"),
            Resampling::Bilinear => write!(f, "bilinear"),
        }
    }
}

impl FromStr for Resampling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" | "near" => Ok(Resampling::Nearest),
            "bilinear" => Ok(Resampling::Bilinear),
            other => Err(format!("unknown resampling '{other}'")),
        }
    }
}

/// Warp `src` into `target_crs` at square `pixel_size`.
///
/// The output covers the reprojected envelope of the source extent; pixels
/// that map outside the source stay zero.
pub fn warp(
    src: &Raster,
    target_crs: Crs,
    pixel_size: f64,
    resampling: Resampling,
) -> Result<Raster, RasterError> {
    warp_cancellable(src, target_crs, pixel_size, resampling, &AtomicBool::new(false))
}

/// Like [`warp`], but stops early once `cancel` is set.
///
/// Rows still pending when the flag is observed are left unsampled and the
/// call returns [`RasterError::Cancelled`].
pub fn warp_cancellable(
    src: &Raster,
    target_crs: Crs,
    pixel_size: f64,
    resampling: Resampling,
    cancel: &AtomicBool,
) -> Result<Raster, RasterError> {
    if !(pixel_size.is_finite() && pixel_size > 0.0) {
        return Err(RasterError::Unsupported(format!(
            "pixel size must be positive, got {pixel_size}"
        )));
    }
    if src.width() == 0 || src.height() == 0 {
        return Err(RasterError::Unsupported("empty source raster".into()));
    }

    let (min_x, min_y, max_x, max_y) = src.bounds();
    let extent = BoundingBox::new(min_x, min_y, max_x, max_y).reproject(src.crs(), target_crs)?;

    let width = (extent.width() / pixel_size).round().max(1.0);
    let height = (extent.height() / pixel_size).round().max(1.0);
    if width * height > MAX_OUTPUT_PIXELS as f64 {
        return Err(RasterError::Unsupported(format!(
            "warped raster of {width}x{height} pixels is too large"
        )));
    }
    let (width, height) = (width as u32, height as u32);
    let transform = GeoTransform::new(extent.min_x, extent.max_y, pixel_size, -pixel_size);

    let inverse = Reprojector::new(target_crs, src.crs())?;
    let grid = ControlGrid::build(&transform, width, height, |x, y| {
        inverse
            .project(x, y)
            .ok()
            .map(|(sx, sy)| src.transform().geo_to_pixel(sx, sy))
    });

    let row_bytes = width as usize * CHANNELS;
    let mut data = vec![0u8; row_bytes * height as usize];
    data.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(row, out)| {
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            for col in 0..width {
                let Some((sx, sy)) = grid.source_pixel(col, row as u32) else {
                    continue;
                };
                let sample = match resampling {
                    Resampling::Nearest => sample_nearest(src, sx, sy),
                    Resampling::Bilinear => sample_bilinear(src, sx, sy),
                };
                if let Some(rgb) = sample {
                    let i = col as usize * CHANNELS;
                    out[i..i + CHANNELS].copy_from_slice(&rgb);
                }
            }
        });
    if cancel.load(Ordering::Relaxed) {
        return Err(RasterError::Cancelled);
    }

    tracing::debug!(
        from = %src.crs(),
        to = %target_crs,
        width,
        height,
        "warped raster"
    );
    Ok(Raster::from_parts(width, height, data, transform, target_crs))
}

/// Source pixel coordinates at every `CONTROL_STEP`-th output pixel centre.
struct ControlGrid {
    nodes_x: usize,
    nodes: Vec<Option<(f64, f64)>>,
}

impl ControlGrid {
    fn build(
        transform: &GeoTransform,
        width: u32,
        height: u32,
        map: impl Fn(f64, f64) -> Option<(f64, f64)>,
    ) -> Self {
        let nodes_x = ((width - 1) / CONTROL_STEP + 2) as usize;
        let nodes_y = ((height - 1) / CONTROL_STEP + 2) as usize;
        let mut nodes = Vec::with_capacity(nodes_x * nodes_y);
        for j in 0..nodes_y {
            for i in 0..nodes_x {
                let col = (i as u32 * CONTROL_STEP) as f64 + 0.5;
                let row = (j as u32 * CONTROL_STEP) as f64 + 0.5;
                let (x, y) = transform.pixel_to_geo(col, row);
                nodes.push(map(x, y));
            }
        }
        Self { nodes_x, nodes }
    }

    fn source_pixel(&self, col: u32, row: u32) -> Option<(f64, f64)> {
        let (i, j) = ((col / CONTROL_STEP) as usize, (row / CONTROL_STEP) as usize);
        let fx = (col % CONTROL_STEP) as f64 / CONTROL_STEP as f64;
        let fy = (row % CONTROL_STEP) as f64 / CONTROL_STEP as f64;

        let node = |i: usize, j: usize| self.nodes[j * self.nodes_x + i];
        let (a, b) = (node(i, j)?, node(i + 1, j)?);
        let (c, d) = (node(i, j + 1)?, node(i + 1, j + 1)?);

        let top = (a.0 + (b.0 - a.0) * fx, a.1 + (b.1 - a.1) * fx);
        let bottom = (c.0 + (d.0 - c.0) * fx, c.1 + (d.1 - c.1) * fx);
        Some((
            top.0 + (bottom.0 - top.0) * fy,
            top.1 + (bottom.1 - top.1) * fy,
        ))
    }
}

fn inside(src: &Raster, sx: f64, sy: f64) -> bool {
    sx >= 0.0 && sy >= 0.0 && sx < src.width() as f64 && sy < src.height() as f64
}

fn sample_nearest(src: &Raster, sx: f64, sy: f64) -> Option<[u8; 3]> {
    if !inside(src, sx, sy) {
        return None;
    }
    src.pixel(sx as u32, sy as u32)
}

fn sample_bilinear(src: &Raster, sx: f64, sy: f64) -> Option<[u8; 3]> {
    if !inside(src, sx, sy) {
        return None;
    }
    // Pixel centres sit at half-integer coordinates.
    let u = (sx - 0.5).max(0.0);
    let v = (sy - 0.5).max(0.0);
    let x0 = (u.floor() as u32).min(src.width() - 1);
    let y0 = (v.floor() as u32).min(src.height() - 1);
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let (fx, fy) = (u - x0 as f64, v - y0 as f64);

    let p00 = src.pixel(x0, y0)?;
    let p10 = src.pixel(x1, y0)?;
    let p01 = src.pixel(x0, y1)?;
    let p11 = src.pixel(x1, y1)?;

    let mut out = [0u8; 3];
    for (ch, value) in out.iter_mut().enumerate() {
        let top = p00[ch] as f64 * (1.0 - fx) + p10[ch] as f64 * fx;
        let bottom = p01[ch] as f64 * (1.0 - fx) + p11[ch] as f64 * fx;
        *value = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}
