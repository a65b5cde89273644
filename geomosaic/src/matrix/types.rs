//! Tile matrix data types.

use crate::geo::Crs;

/// Physical pixel pitch assumed by the OGC WMTS standard (0.28 mm).
pub const OGC_PIXEL_SIZE_M: f64 = 0.00028;

/// How a fetched canvas becomes the final mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Tiles already arrive in the working CRS at the wanted resolution;
    /// the canvas is moved into place as is.
    Rename,
    /// The canvas is reprojected and resampled to the target CRS and
    /// pixel size.
    Warp,
}

impl std::str::FromStr for Delivery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rename" => Ok(Delivery::Rename),
            "warp" => Ok(Delivery::Warp),
            other => Err(format!("unknown delivery '{other}', expected rename or warp")),
        }
    }
}

/// Geometry of one zoom level, as advertised by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMatrixGeometry {
    pub scale_denominator: f64,
    /// `(x, y)` of the top-left corner of tile (0, 0)
    pub top_left: (f64, f64),
    pub tile_width: u32,
    pub tile_height: u32,
    /// Number of tile columns, when advertised
    pub matrix_width: Option<u64>,
    /// Number of tile rows, when advertised
    pub matrix_height: Option<u64>,
}

/// Everything needed to plan and fetch tiles for one `(year, pixel size)`.
///
/// Immutable once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMatrixDescriptor {
    /// Service endpoint, without query string
    pub endpoint: String,
    pub layer_name: String,
    pub tile_matrix_set: String,
    /// TileMatrix identifier within the set
    pub zoom_level: String,
    pub crs: Crs,
    /// Tile image MIME type
    pub format: String,
    pub delivery: Delivery,
    pub geometry: TileMatrixGeometry,
}

impl TileMatrixDescriptor {
    /// Ground size of one tile pixel in CRS units.
    pub fn tile_pixel_size(&self) -> f64 {
        self.geometry.scale_denominator * OGC_PIXEL_SIZE_M
    }

    pub fn scale_denominator(&self) -> f64 {
        self.geometry.scale_denominator
    }

    pub fn top_left(&self) -> (f64, f64) {
        self.geometry.top_left
    }

    pub fn tile_width(&self) -> u32 {
        self.geometry.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.geometry.tile_height
    }

    /// Whether `(row, col)` exists in the matrix. Unknown bounds admit
    /// every non-negative index.
    pub fn contains_tile(&self, row: i64, col: i64) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        let rows_ok = self.geometry.matrix_height.map_or(true, |h| (row as u64) < h);
        let cols_ok = self.geometry.matrix_width.map_or(true, |w| (col as u64) < w);
        rows_ok && cols_ok
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::one_metre_descriptor;

    #[test]
    fn test_tile_pixel_size() {
        let d = one_metre_descriptor();
        assert!((d.tile_pixel_size() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains_tile_respects_matrix_bounds() {
        let d = one_metre_descriptor();
        assert!(d.contains_tile(0, 0));
        assert!(d.contains_tile(4095, 4095));
        assert!(!d.contains_tile(4096, 0));
        assert!(!d.contains_tile(0, -1));
    }

    #[test]
    fn test_contains_tile_without_advertised_bounds() {
        let mut d = one_metre_descriptor();
        d.geometry.matrix_width = None;
        d.geometry.matrix_height = None;
        assert!(d.contains_tile(1_000_000, 1_000_000));
        assert!(!d.contains_tile(-1, 0));
    }
}
