//! One `(city, year)` mosaic build.
//!
//! [`MosaicBuilder`] wires the stages together: it resolves the tile matrix
//! for the year, reprojects the request's bounding box into the matrix CRS,
//! plans the tile range, fetches the tiles into a canvas and hands that to the
//! postprocessor. Any stage error aborts the build; the scratch directory is
//! removed regardless.

mod builder;
mod error;
mod request;

pub use builder::{MosaicBuilder, MosaicOutcome};
pub use error::MosaicError;
pub use request::MosaicRequest;
