//! Coordinate reference systems, bounding boxes and affine transforms.
//!
//! Everything in this module works in map units of a projected CRS unless a
//! function says otherwise. Reprojection goes through `proj4rs` with PROJ
//! strings looked up from the `crs-definitions` EPSG database, so no system
//! PROJ installation is needed.

mod bbox;
mod crs;
mod transform;

pub use bbox::BoundingBox;
pub use crs::{Crs, CrsError, Reprojector, RD_NEW, RD_NEW_WKT};
pub use transform::GeoTransform;
