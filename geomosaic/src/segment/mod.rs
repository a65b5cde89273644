//! Grid-aligned patch extraction.
//!
//! Every label cell is normalized to its canonical 100 m square
//! ([`CanonicalCell`]); the patch is the fixed-size window centred on that
//! square. Windows that do not fit entirely inside the mosaic are skipped,
//! never padded, and a cell whose patch already exists is left alone unless
//! overwriting is requested.

mod cell;
mod error;
mod segmenter;

pub use cell::{CanonicalCell, GridCell, CELL_SIZE};
pub use error::PatchError;
pub use segmenter::{CellOutcome, GridPatchSegmenter, SegmentReport};
