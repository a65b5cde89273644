//! Patches command - cut a mosaic into patches centred on grid cells.

use std::path::PathBuf;

use clap::Args;
use geomosaic::config::PatchConfig;
use geomosaic::labels::read_grid_cells;
use geomosaic::raster::read_geotiff;
use geomosaic::segment::GridPatchSegmenter;
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the patches command.
#[derive(Debug, Args)]
pub struct PatchesArgs {
    /// Mosaic GeoTIFF to cut
    #[arg(long)]
    pub mosaic: PathBuf,

    /// GeoJSON file with the grid cells to extract
    #[arg(long)]
    pub labels: PathBuf,

    /// Directory receiving one file per cell
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Patch width in metres [config: patches.width]
    #[arg(long)]
    pub width: Option<f64>,

    /// Patch height in metres [config: patches.height]
    #[arg(long)]
    pub height: Option<f64>,

    /// JPEG quality for compressed patches [config: patches.jpeg_quality]
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: Option<u8>,

    /// Replace patches that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Keep GeoTIFF patches instead of re-encoding to JPEG
    #[arg(long)]
    pub no_compress: bool,
}

impl PatchesArgs {
    /// Merge arguments over the configured patch defaults.
    pub fn to_config(&self, base: PatchConfig) -> PatchConfig {
        let mut config = base.with_size(
            self.width.unwrap_or(base.width_m()),
            self.height.unwrap_or(base.height_m()),
        );
        if let Some(quality) = self.jpeg_quality {
            config = config.with_jpeg_quality(quality);
        }
        if self.overwrite {
            config = config.with_overwrite(true);
        }
        if self.no_compress {
            config = config.with_compress(false);
        }
        config
    }
}

/// Run the patches command.
pub fn run(runner: &CliRunner, args: PatchesArgs) -> Result<(), CliError> {
    runner.log_startup("patches");
    let config = args.to_config(runner.config().patch_config());

    let mosaic = read_geotiff(&args.mosaic).map_err(|error| CliError::ReadMosaic {
        path: args.mosaic.clone(),
        error,
    })?;
    let cells = read_grid_cells(&args.labels)?;
    info!(
        "{} cells from {}, mosaic {}x{}",
        cells.len(),
        args.labels.display(),
        mosaic.width(),
        mosaic.height()
    );
    println!("Cutting {} cells from {}", cells.len(), args.mosaic.display());

    let segmenter = GridPatchSegmenter::new(config, runner.logger());
    let report = segmenter.segment_all(&mosaic, &cells, &args.output_dir)?;

    println!("  Written: {}", report.written.len());
    println!("  Already present: {}", report.skipped_existing);
    println!("  Outside mosaic: {}", report.out_of_bounds);
    if !report.failed.is_empty() {
        println!("  Failed: {}", report.failed.len());
        for error in &report.failed {
            println!("    {}", error);
        }
    }
    println!("Patches in {}", args.output_dir.display());

    Ok(())
}
