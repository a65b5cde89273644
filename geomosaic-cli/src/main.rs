//! geomosaic CLI - Command-line interface
//!
//! Builds aerial mosaics, fetches grid labels and cuts training patches.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod runner;

use commands::labels::LabelsArgs;
use commands::mosaic::MosaicArgs;
use commands::patches::PatchesArgs;
use error::CliError;
use runner::{CliRunner, GlobalOptions};

#[derive(Parser)]
#[command(name = "geomosaic")]
#[command(version = geomosaic::VERSION)]
#[command(about = "Georeferenced aerial mosaics and grid-cell training patches", long_about = None)]
struct Cli {
    /// Config file (default: ~/.geomosaic/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for geomosaic
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a mosaic for one city and year from WMTS tiles
    Mosaic(MosaicArgs),

    /// Cut a mosaic into patches centred on 100 m grid cells
    Patches(PatchesArgs),

    /// Fetch scored grid cells from the label service as GeoJSON
    Labels(LabelsArgs),
}

impl Cli {
    fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            config: self.config.clone(),
            verbose: self.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let runner = CliRunner::new(&cli.global_options())?;
    match cli.command {
        Commands::Mosaic(args) => commands::mosaic::run(&runner, args),
        Commands::Patches(args) => commands::patches::run(&runner, args),
        Commands::Labels(args) => commands::labels::run(&runner, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use geomosaic::config::{ConfigFile, PatchConfig};
    use geomosaic::geo::{Crs, RD_NEW};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mosaic_arguments() {
        let cli = parse(&[
            "geomosaic",
            "mosaic",
            "--city",
            "utrecht",
            "--year",
            "20",
            "--bbox",
            "139267,456844,143267,460844",
            "--pixel-size",
            "0.5",
            "--force",
        ]);
        let Commands::Mosaic(args) = cli.command else {
            panic!("expected mosaic command");
        };
        assert_eq!(args.city, "utrecht");
        assert_eq!(args.bbox_crs, RD_NEW);
        assert_eq!(args.bbox.min_x, 139_267.0);
        assert_eq!(args.bbox.max_y, 460_844.0);
        assert!(args.force);

        let defaults = ConfigFile::default();
        let request = args.to_request(&defaults.imagery);
        assert_eq!(request.year, 2020);
        assert_eq!(request.pixel_size, 0.5);
        assert_eq!(request.padding, defaults.imagery.padding);
        assert_eq!(request.output_dir, defaults.imagery.output_dir);
        assert_eq!(request.label(), "utrecht/2020");
    }

    #[test]
    fn test_mosaic_bbox_crs_accepts_epsg_prefix() {
        let cli = parse(&[
            "geomosaic",
            "mosaic",
            "--city",
            "amsterdam",
            "--year",
            "2018",
            "--bbox",
            "4.85,52.35,4.95,52.40",
            "--bbox-crs",
            "EPSG:4326",
        ]);
        let Commands::Mosaic(args) = cli.command else {
            panic!("expected mosaic command");
        };
        assert_eq!(args.bbox_crs, Crs(4326));
        assert!(!args.force);
    }

    #[test]
    fn test_mosaic_requires_bbox() {
        let result = Cli::try_parse_from(["geomosaic", "mosaic", "--city", "x", "--year", "2020"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_bbox_is_rejected() {
        let result = Cli::try_parse_from([
            "geomosaic", "mosaic", "--city", "x", "--year", "2020", "--bbox", "1,2,3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_patches_arguments_override_config() {
        let cli = parse(&[
            "geomosaic",
            "patches",
            "--mosaic",
            "utrecht_2020.tiff",
            "--labels",
            "cells.geojson",
            "--output-dir",
            "patches",
            "--width",
            "350",
            "--no-compress",
        ]);
        let Commands::Patches(args) = cli.command else {
            panic!("expected patches command");
        };
        let config = args.to_config(PatchConfig::default());
        assert_eq!(config.width_m(), 350.0);
        assert_eq!(config.height_m(), PatchConfig::DEFAULT_SIZE_M);
        assert!(!config.compress());
        assert!(!config.overwrite());
    }

    #[test]
    fn test_patches_jpeg_quality_range() {
        let result = Cli::try_parse_from([
            "geomosaic",
            "patches",
            "--mosaic",
            "m.tiff",
            "--labels",
            "c.geojson",
            "--output-dir",
            "out",
            "--jpeg-quality",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_labels_with_global_options() {
        let cli = parse(&[
            "geomosaic",
            "labels",
            "--year",
            "2020",
            "--bbox",
            "139000,456000,140000,457000",
            "--output",
            "labels.geojson",
            "--config",
            "/tmp/custom.ini",
            "-v",
        ]);
        let options = cli.global_options();
        assert_eq!(options.config, Some(PathBuf::from("/tmp/custom.ini")));
        assert!(options.verbose);
        let Commands::Labels(args) = cli.command else {
            panic!("expected labels command");
        };
        assert_eq!(args.year, 2020);
        assert!(args.wfs_url.is_none());
    }
}
