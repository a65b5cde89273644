//! Mosaic command - build one georeferenced mosaic for a city and year.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use geomosaic::config::ImagerySettings;
use geomosaic::fetch::TokioTimer;
use geomosaic::geo::{BoundingBox, Crs};
use geomosaic::matrix::{normalize_year, TileMatrixResolver, WmtsCapabilities};
use geomosaic::mosaic::{MosaicBuilder, MosaicOutcome, MosaicRequest};
use geomosaic::provider::WmtsSourceFactory;
use tracing::warn;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the mosaic command.
#[derive(Debug, Args)]
pub struct MosaicArgs {
    /// City name, used in the output file name
    #[arg(long)]
    pub city: String,

    /// Survey year (two-digit years mean 20xx)
    #[arg(long)]
    pub year: u16,

    /// Area to cover as min_x,min_y,max_x,max_y
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: BoundingBox,

    /// CRS of --bbox (EPSG code)
    #[arg(long, default_value = "28992")]
    pub bbox_crs: Crs,

    /// CRS of the output mosaic [config: imagery.target_crs]
    #[arg(long)]
    pub target_crs: Option<Crs>,

    /// Output ground pixel size in metres [config: imagery.pixel_size]
    #[arg(long)]
    pub pixel_size: Option<f64>,

    /// Extra coverage around the bounding box in metres [config: imagery.padding]
    #[arg(long)]
    pub padding: Option<f64>,

    /// Root directory for mosaics [config: imagery.output_dir]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Rebuild even if the mosaic already exists
    #[arg(long)]
    pub force: bool,
}

impl MosaicArgs {
    /// Merge arguments over the configured imagery defaults.
    pub fn to_request(&self, imagery: &ImagerySettings) -> MosaicRequest {
        MosaicRequest::new(self.city.clone(), normalize_year(self.year), self.bbox)
            .with_bbox_crs(self.bbox_crs)
            .with_target_crs(self.target_crs.unwrap_or(imagery.target_crs))
            .with_pixel_size(self.pixel_size.unwrap_or(imagery.pixel_size))
            .with_padding(self.padding.unwrap_or(imagery.padding))
            .with_output_dir(self.output_dir.as_ref().unwrap_or(&imagery.output_dir))
            .with_force(self.force)
    }
}

/// Run the mosaic command.
pub fn run(runner: &CliRunner, args: MosaicArgs) -> Result<(), CliError> {
    runner.log_startup("mosaic");
    let config = runner.config();
    let fetch_config = config.fetch_config();

    let client = runner.http_client(fetch_config.request_timeout())?;
    let resolver = TileMatrixResolver::new(
        config.catalog.clone(),
        WmtsCapabilities::new(Arc::clone(&client)),
    );
    let builder = MosaicBuilder::new(
        resolver,
        WmtsSourceFactory::new(client),
        Arc::new(TokioTimer),
        runner.logger(),
    )
    .with_fetch_config(fetch_config)
    .with_postprocess_config(config.postprocess_config());

    let request = args.to_request(&config.imagery);
    println!("Building mosaic {}", request.label());
    println!("  Bounding box: {} ({})", request.bbox, request.bbox_crs);
    println!("  Pixel size: {} m, padding {} m", request.pixel_size, request.padding);
    println!();

    let start = Instant::now();
    match runner.block_on(builder.build(&request))? {
        MosaicOutcome::Built { path, report } => {
            println!(
                "Fetched {}/{} tiles in {:.1}s",
                report.fetched,
                report.planned,
                start.elapsed().as_secs_f64()
            );
            if !report.failed.is_empty() {
                warn!("{} tiles left blank", report.failed.len());
                println!("  {} tiles failed and were left blank", report.failed.len());
            }
            println!("Saved: {}", path.display());
        }
        MosaicOutcome::AlreadyExists(path) => {
            println!("Already exists: {} (use --force to rebuild)", path.display());
        }
    }

    Ok(())
}
