//! geomosaic - Georeferenced aerial mosaics and training patches
//!
//! Builds one GeoTIFF mosaic per city and year from a WMTS aerial imagery
//! service, then cuts the mosaic into fixed-size patches centred on the
//! cells of a 100 m grid.
//!
//! # High-Level API
//!
//! ```ignore
//! use geomosaic::mosaic::{MosaicBuilder, MosaicRequest};
//!
//! let request = MosaicRequest::new("utrecht", "2020", bbox);
//! let outcome = builder.build(&request).await?;
//!
//! let segmenter = GridPatchSegmenter::new(PatchConfig::default(), logger);
//! let report = segmenter.segment_all(&mosaic, &cells, patch_dir)?;
//! ```
//!
//! The pipeline stages live in their own modules: [`matrix`] resolves the
//! service's tile matrix, [`plan`] turns a bounding box into tile indices,
//! [`fetch`] downloads and stitches them, and [`postprocess`] writes and
//! reprojects the result.

pub mod config;
pub mod fetch;
pub mod geo;
pub mod labels;
pub mod log;
pub mod logging;
pub mod matrix;
pub mod mosaic;
pub mod plan;
pub mod postprocess;
pub mod provider;
pub mod raster;
pub mod segment;

/// Version of the geomosaic library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
