//! Cutting a mosaic into one fixed-size patch per grid cell.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use super::cell::{CanonicalCell, GridCell};
use super::error::PatchError;
use crate::config::PatchConfig;
use crate::geo::RD_NEW_WKT;
use crate::log::Logger;
use crate::plan::PixelWindow;
use crate::raster::{write_geotiff, Raster, RasterError};
use crate::{log_debug, log_info, log_warn};

/// What happened to one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    Written(PathBuf),
    /// A patch for this cell is already on disk.
    SkippedExisting,
    /// The patch window does not fit inside the mosaic.
    OutOfBounds,
}

#[derive(Debug, Default)]
pub struct SegmentReport {
    pub written: Vec<PathBuf>,
    pub skipped_existing: usize,
    pub out_of_bounds: usize,
    pub failed: Vec<PatchError>,
}

/// Extracts patches centred on canonical grid cells.
pub struct GridPatchSegmenter {
    config: PatchConfig,
    logger: Arc<dyn Logger>,
}

impl GridPatchSegmenter {
    pub fn new(config: PatchConfig, logger: Arc<dyn Logger>) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Pixel window of the patch centred on `cell`, or `None` unless it lies
    /// strictly inside `mosaic`. A window touching the raster edge is dropped.
    pub fn patch_window(&self, mosaic: &Raster, cell: &CanonicalCell) -> Option<PixelWindow> {
        let t = mosaic.transform();
        let width = (self.config.width_m() / t.pixel_width.abs()).round();
        let height = (self.config.height_m() / t.pixel_height.abs()).round();
        if !(width >= 1.0 && height >= 1.0) {
            return None;
        }

        let (cx, cy) = cell.center();
        let (col, row) = t.geo_to_pixel(
            cx - self.config.width_m() / 2.0,
            cy + self.config.height_m() / 2.0,
        );
        let (col, row) = (col.round(), row.round());

        let fits = col > 0.0
            && row > 0.0
            && col + width < mosaic.width() as f64
            && row + height < mosaic.height() as f64;
        fits.then(|| PixelWindow {
            x: col as u32,
            y: row as u32,
            width: width as u32,
            height: height as u32,
        })
    }

    /// Write the patch of one cell into `out_dir`.
    pub fn segment_cell(
        &self,
        mosaic: &Raster,
        cell: &GridCell,
        out_dir: &Path,
    ) -> Result<CellOutcome, PatchError> {
        if !is_file_stem(&cell.id) {
            return Err(PatchError::InvalidCellId(cell.id.clone()));
        }
        let Some(window) = self.patch_window(mosaic, &cell.canonical()) else {
            return Ok(CellOutcome::OutOfBounds);
        };

        let tiff_path = out_dir.join(format!("{}.tiff", cell.id));
        let jpeg_path = out_dir.join(format!("{}.jpg", cell.id));
        if !self.config.overwrite() && (tiff_path.exists() || jpeg_path.exists()) {
            return Ok(CellOutcome::SkippedExisting);
        }

        let written = self.write_patch(mosaic, window, &tiff_path, &jpeg_path);
        if written.is_err() {
            // A partial file would make the next run skip this cell
            remove_partial(&tiff_path);
            remove_partial(&jpeg_path);
        }
        written
            .map(CellOutcome::Written)
            .map_err(|source| PatchError::PatchIoFailed {
                id: cell.id.clone(),
                source,
            })
    }

    fn write_patch(
        &self,
        mosaic: &Raster,
        window: PixelWindow,
        tiff_path: &Path,
        jpeg_path: &Path,
    ) -> Result<PathBuf, RasterError> {
        let patch = mosaic.crop(window.x, window.y, window.width, window.height)?;
        write_geotiff(&patch, tiff_path, Some(RD_NEW_WKT))?;

        if !self.config.compress() {
            return Ok(tiff_path.to_path_buf());
        }
        write_jpeg(&patch, jpeg_path, self.config.jpeg_quality())?;
        std::fs::remove_file(tiff_path)?;
        Ok(jpeg_path.to_path_buf())
    }

    /// Segment every cell, one after the other. Per-cell failures are logged
    /// and collected; they never stop the batch.
    pub fn segment_all(
        &self,
        mosaic: &Raster,
        cells: &[GridCell],
        out_dir: &Path,
    ) -> Result<SegmentReport, PatchError> {
        let (width_m, height_m) = (self.config.width_m(), self.config.height_m());
        if !(width_m.is_finite() && height_m.is_finite() && width_m > 0.0 && height_m > 0.0) {
            return Err(PatchError::InvalidSize { width_m, height_m });
        }
        std::fs::create_dir_all(out_dir).map_err(|source| PatchError::OutputDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let mut report = SegmentReport::default();
        for cell in cells {
            match self.segment_cell(mosaic, cell, out_dir) {
                Ok(CellOutcome::Written(path)) => {
                    log_debug!(self.logger, "patch {} written", path.display());
                    report.written.push(path);
                }
                Ok(CellOutcome::SkippedExisting) => report.skipped_existing += 1,
                Ok(CellOutcome::OutOfBounds) => report.out_of_bounds += 1,
                Err(e) => {
                    log_warn!(self.logger, "{}", e);
                    report.failed.push(e);
                }
            }
        }

        log_info!(
            self.logger,
            "{} patches written, {} already present, {} outside the mosaic, {} failed",
            report.written.len(),
            report.skipped_existing,
            report.out_of_bounds,
            report.failed.len()
        );
        Ok(report)
    }
}

fn is_file_stem(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(|c: char| c == '/' || c == '\\' || c == '\0')
}

fn remove_partial(path: &Path) {
    if path.is_file() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not remove partial patch");
        }
    }
}

fn write_jpeg(patch: &Raster, path: &Path, quality: u8) -> Result<(), RasterError> {
    let mut writer = BufWriter::new(File::create(path)?);
    JpegEncoder::new_with_quality(&mut writer, quality).encode(
        patch.data(),
        patch.width(),
        patch.height(),
        ExtendedColorType::Rgb8,
    )?;
    writer.flush()?;
    Ok(())
}
