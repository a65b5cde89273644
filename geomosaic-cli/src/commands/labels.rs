//! Labels command - fetch scored grid cells for one year and area.

use std::path::PathBuf;

use clap::Args;
use geomosaic::geo::BoundingBox;
use geomosaic::labels::{write_scored_cells, WfsLabelClient};
use geomosaic::matrix::normalize_year;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the labels command.
#[derive(Debug, Args)]
pub struct LabelsArgs {
    /// Label year (two-digit years mean 20xx)
    #[arg(long)]
    pub year: u16,

    /// Area as min_x,min_y,max_x,max_y in RD New metres
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: BoundingBox,

    /// GeoJSON file to write
    #[arg(long)]
    pub output: PathBuf,

    /// Feature service endpoint [config: labels.wfs_url]
    #[arg(long)]
    pub wfs_url: Option<String>,
}

/// Run the labels command.
pub fn run(runner: &CliRunner, args: LabelsArgs) -> Result<(), CliError> {
    runner.log_startup("labels");
    let settings = &runner.config().labels;
    let timeout = runner.config().fetch_config().request_timeout();

    let client = WfsLabelClient::new(runner.http_client(timeout)?)
        .with_url(args.wfs_url.clone().unwrap_or_else(|| settings.wfs_url.clone()))
        .with_page_size(settings.page_size);

    let year = normalize_year(args.year);
    println!("Fetching {} labels for {}", year, args.bbox);
    let cells = runner.block_on(client.fetch_scored_cells(year, &args.bbox))?;

    write_scored_cells(&args.output, &cells)?;
    println!("Saved {} cells: {}", cells.len(), args.output.display());

    Ok(())
}
