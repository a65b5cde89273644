//! Liveability labels: the feature service client and GeoJSON files.
//!
//! The feature service returns grid scores clipped to building footprints.
//! Every fetched polygon is unclipped back to its canonical 100 m square
//! before it is stored, so the segmenter can rely on centroids alone.

mod cells;
mod client;
mod error;
mod io;

pub use cells::{ScoredCell, SCORE_COLUMNS};
pub use client::{WfsLabelClient, DEFAULT_PAGE_SIZE, DEFAULT_WFS_URL};
pub use error::LabelError;
pub use io::{read_grid_cells, read_scored_cells, write_scored_cells};
