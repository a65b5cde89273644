//! Tile matrix resolution.
//!
//! Turns a survey year and a target ground pixel size into a fully described
//! WMTS tile matrix: which service and layer to ask, which tile matrix set and
//! zoom level, and the matrix geometry (scale, origin, tile size).
//!
//! Service selection is data driven. An [`ImageryCatalog`] maps year ranges to
//! [`ServiceTemplate`]s; the only network traffic is a single GetCapabilities
//! request through a [`CapabilitiesSource`], made after the catalog lookup so
//! unsupported years fail without touching the network.
//!
//! ```
//! use geomosaic::matrix::{ImageryCatalog, MatrixError};
//!
//! let catalog = ImageryCatalog::netherlands();
//! let template = catalog.template_for(2020).unwrap();
//! assert_eq!(template.layer_for(2020), "2020_ortho25");
//! assert_eq!(template.zoom.select(0.5), "13");
//!
//! assert!(matches!(catalog.template_for(2010), Err(MatrixError::UnsupportedYear(2010))));
//! ```

mod capabilities;
mod catalog;
mod error;
mod resolver;
pub(crate) mod types;

pub use capabilities::{parse_tile_matrix, CapabilitiesSource, WmtsCapabilities};
pub use catalog::{normalize_year, ImageryCatalog, ServiceTemplate, YearRange, ZoomSelection};
pub use error::MatrixError;
pub use resolver::TileMatrixResolver;
pub use types::{Delivery, TileMatrixDescriptor, TileMatrixGeometry, OGC_PIXEL_SIZE_M};
