//! Axis-aligned bounding boxes.

use std::fmt;
use std::str::FromStr;

use super::crs::{Crs, CrsError, Reprojector};

/// Axis-aligned rectangle in map units: `[min_x, max_x] × [min_y, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Build a box from two corners in any order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// A box anchored at its lower-left corner.
    pub fn from_origin(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Envelope of this box after reprojection.
    ///
    /// Corners and edge midpoints are projected, which keeps the envelope
    /// tight for the mildly curved edges of a city-sized box.
    pub fn reproject(&self, from: Crs, to: Crs) -> Result<Self, CrsError> {
        let reprojector = Reprojector::new(from, to)?;
        if reprojector.is_identity() {
            return Ok(*self);
        }

        let (cx, cy) = self.center();
        let samples = [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.min_x, self.max_y),
            (self.max_x, self.max_y),
            (cx, self.min_y),
            (cx, self.max_y),
            (self.min_x, cy),
            (self.max_x, cy),
        ];

        let mut out = Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for (x, y) in samples {
            let (px, py) = reprojector.project(x, y)?;
            out.min_x = out.min_x.min(px);
            out.min_y = out.min_y.min(py);
            out.max_x = out.max_x.max(px);
            out.max_y = out.max_y.max(py);
        }
        Ok(out)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Parses `min_x,min_y,max_x,max_y`.
impl FromStr for BoundingBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid bounding box '{s}': {e}"))?;

        match values.as_slice() {
            [x0, y0, x1, y1] if values.iter().all(|v| v.is_finite()) => {
                Ok(Self::new(*x0, *y0, *x1, *y1))
            }
            _ => Err(format!(
                "invalid bounding box '{s}': expected min_x,min_y,max_x,max_y"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::RD_NEW;

    #[test]
    fn test_new_normalizes_corners() {
        let b = BoundingBox::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!(b.min_x, 0.0);
        assert_eq!(b.max_x, 10.0);
        assert_eq!(b.min_y, 5.0);
        assert_eq!(b.max_y, 20.0);
    }

    #[test]
    fn test_parse() {
        let b: BoundingBox = "139267,456844,143267,460844".parse().unwrap();
        assert_eq!(b.width(), 4000.0);
        assert_eq!(b.height(), 4000.0);
        assert!("1,2,3".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let b = BoundingBox::from_origin(139_267.0, 456_844.0, 4000.0, 4000.0);
        let parsed: BoundingBox = b.to_string().parse().unwrap();
        assert_eq!(parsed, b);
    }

    #[test]
    fn test_same_crs_reprojection_is_identity() {
        let b = BoundingBox::from_origin(139_267.0, 456_844.0, 4000.0, 4000.0);
        assert_eq!(b.reproject(RD_NEW, RD_NEW).unwrap(), b);
    }

    #[test]
    fn test_reprojected_envelope_contains_projected_center() {
        let b = BoundingBox::from_origin(139_267.0, 456_844.0, 4000.0, 4000.0);
        let wgs = b.reproject(RD_NEW, Crs(4326)).unwrap();
        let (cx, cy) = b.center();
        let (lon, lat) = Reprojector::new(RD_NEW, Crs(4326))
            .unwrap()
            .project(cx, cy)
            .unwrap();
        assert!(wgs.contains(lon, lat));
        assert!(wgs.width() < 0.1);
    }
}
