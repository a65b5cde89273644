//! Label grid cells and their canonical 100 m squares.

use crate::geo::BoundingBox;

/// Edge length of a label grid cell, in metres.
pub const CELL_SIZE: f64 = 100.0;

/// A label polygon reduced to what the segmenter needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub id: String,
    pub centroid: (f64, f64),
}

impl GridCell {
    pub fn new(id: impl Into<String>, centroid: (f64, f64)) -> Self {
        Self {
            id: id.into(),
            centroid,
        }
    }

    pub fn canonical(&self) -> CanonicalCell {
        CanonicalCell::from_centroid(self.centroid)
    }
}

/// The full, unclipped grid square a centroid belongs to.
///
/// Label polygons may arrive clipped to building footprints; only their
/// centroid is trusted, floored to the 100 m grid.
///
/// ```
/// use geomosaic::segment::CanonicalCell;
///
/// let cell = CanonicalCell::from_centroid((139_345.0, 456_891.0));
/// assert_eq!(cell.origin(), (139_300.0, 456_800.0));
/// assert_eq!(cell.center(), (139_350.0, 456_850.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalCell {
    origin: (f64, f64),
}

impl CanonicalCell {
    pub fn from_centroid((x, y): (f64, f64)) -> Self {
        Self {
            origin: (x - x.rem_euclid(CELL_SIZE), y - y.rem_euclid(CELL_SIZE)),
        }
    }

    /// Lower-left corner.
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.origin.0 + CELL_SIZE / 2.0,
            self.origin.1 + CELL_SIZE / 2.0,
        )
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_origin(self.origin.0, self.origin.1, CELL_SIZE, CELL_SIZE)
    }

    /// Closed exterior ring, counter-clockwise from the origin.
    pub fn ring(&self) -> Vec<(f64, f64)> {
        let (x0, y0) = self.origin;
        let (x1, y1) = (x0 + CELL_SIZE, y0 + CELL_SIZE);
        vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_floor_to_grid() {
        let cell = CanonicalCell::from_centroid((139_345.0, 456_891.0));
        assert_eq!(cell.origin(), (139_300.0, 456_800.0));
        assert_eq!(
            cell.bounds(),
            BoundingBox::new(139_300.0, 456_800.0, 139_400.0, 456_900.0)
        );
    }

    #[test]
    fn test_centroid_on_grid_line_stays() {
        let cell = CanonicalCell::from_centroid((139_300.0, 456_900.0));
        assert_eq!(cell.origin(), (139_300.0, 456_900.0));
    }

    #[test]
    fn test_ring_is_closed() {
        let ring = CanonicalCell::from_centroid((50.0, 50.0)).ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    proptest! {
        #[test]
        fn prop_centroid_lies_in_its_cell(x in 0.0f64..300_000.0, y in 300_000.0f64..650_000.0) {
            let cell = CanonicalCell::from_centroid((x, y));
            let (ox, oy) = cell.origin();
            prop_assert!(ox <= x && x < ox + CELL_SIZE);
            prop_assert!(oy <= y && y < oy + CELL_SIZE);
            prop_assert_eq!(ox % CELL_SIZE, 0.0);
            prop_assert_eq!(oy % CELL_SIZE, 0.0);
        }
    }
}
