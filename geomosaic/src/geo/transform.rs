//! North-up affine geotransform.

/// Maps raster pixel coordinates to map coordinates for a north-up raster:
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is negative for the usual top-down row order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X of the upper-left corner of pixel (0, 0)
    pub origin_x: f64,
    /// Y of the upper-left corner of pixel (0, 0)
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// From GDAL order `[origin_x, pixel_width, 0, origin_y, 0, pixel_height]`.
    /// Rotation terms are ignored.
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self::new(coeffs[0], coeffs[3], coeffs[1], coeffs[5])
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }

    /// Map coordinate of a (fractional) pixel position.
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }

    /// Fractional pixel position of a map coordinate.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// `(min_x, min_y, max_x, max_y)` covered by a `width × height` raster.
    pub fn bounds(&self, width: u32, height: u32) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.pixel_to_geo(0.0, 0.0);
        let (x1, y1) = self.pixel_to_geo(width as f64, height as f64);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// The transform of a sub-window starting at pixel `(col, row)`.
    pub fn shifted(&self, col: i64, row: i64) -> Self {
        let (x, y) = self.pixel_to_geo(col as f64, row as f64);
        Self::new(x, y, self.pixel_width, self.pixel_height)
    }
}
