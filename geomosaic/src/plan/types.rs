//! Plan data types.

use std::fmt;

use thiserror::Error;

use crate::geo::{Crs, GeoTransform};

/// One remote tile. Rows grow southwards, columns eastwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    pub row: i64,
    pub col: i64,
}

impl TileIndex {
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(row {}, col {})", self.row, self.col)
    }
}

/// Rectangle of canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelWindow {
    pub fn intersects(&self, other: &PixelWindow) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Errors from [`plan`](super::plan).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("invalid plan parameter: {0}")]
    InvalidParameter(String),

    #[error("canvas of {tiles} tiles × {tile_px} px does not fit in memory")]
    CanvasTooLarge { tiles: i64, tile_px: u32 },
}

/// Tile range and canvas geometry for one mosaic build.
///
/// `max_row` and `max_col` are exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub min_row: i64,
    pub max_row: i64,
    pub min_col: i64,
    pub max_col: i64,
    pub tile_width: u32,
    pub tile_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub transform: GeoTransform,
    pub crs: Crs,
}

impl FetchPlan {
    pub fn rows(&self) -> i64 {
        self.max_row - self.min_row
    }

    pub fn cols(&self) -> i64 {
        self.max_col - self.min_col
    }

    pub fn tile_count(&self) -> usize {
        (self.rows() * self.cols()) as usize
    }

    /// Every tile of the plan, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        (self.min_row..self.max_row)
            .flat_map(move |row| (self.min_col..self.max_col).map(move |col| TileIndex::new(row, col)))
    }

    /// Canvas window of `tile`, or `None` when the tile is outside the plan.
    pub fn window(&self, tile: TileIndex) -> Option<PixelWindow> {
        let in_rows = (self.min_row..self.max_row).contains(&tile.row);
        let in_cols = (self.min_col..self.max_col).contains(&tile.col);
        if !(in_rows && in_cols) {
            return None;
        }
        Some(PixelWindow {
            x: (tile.col - self.min_col) as u32 * self.tile_width,
            y: (tile.row - self.min_row) as u32 * self.tile_height,
            width: self.tile_width,
            height: self.tile_height,
        })
    }
}
