//! Parameters of one (city, year) build.

use std::path::{Path, PathBuf};

use super::MosaicError;
use crate::geo::{BoundingBox, Crs, RD_NEW};

/// One mosaic to build.
///
/// ```
/// use geomosaic::geo::BoundingBox;
/// use geomosaic::mosaic::MosaicRequest;
///
/// let bbox = BoundingBox::new(133_000.0, 453_000.0, 141_000.0, 461_000.0);
/// let request = MosaicRequest::new("utrecht", 2020, bbox).with_output_dir("data/tiles");
/// assert!(request.output_path().ends_with("2020/utrecht_2020.tiff"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicRequest {
    pub city: String,
    pub year: u16,
    pub bbox: BoundingBox,
    /// Reference system `bbox` is expressed in
    pub bbox_crs: Crs,
    /// Reference system of the final mosaic
    pub target_crs: Crs,
    /// Output ground resolution in target CRS units
    pub pixel_size: f64,
    /// Extra coverage around `bbox`, in metres
    pub padding: f64,
    pub output_dir: PathBuf,
    /// Rebuild even when the output file exists
    pub force: bool,
}

impl MosaicRequest {
    pub const DEFAULT_PIXEL_SIZE: f64 = 1.0;
    pub const DEFAULT_PADDING: f64 = 1200.0;

    pub fn new(city: impl Into<String>, year: u16, bbox: BoundingBox) -> Self {
        Self {
            city: city.into(),
            year,
            bbox,
            bbox_crs: RD_NEW,
            target_crs: RD_NEW,
            pixel_size: Self::DEFAULT_PIXEL_SIZE,
            padding: Self::DEFAULT_PADDING,
            output_dir: PathBuf::from("data/tiles"),
            force: false,
        }
    }

    pub fn with_bbox_crs(mut self, crs: Crs) -> Self {
        self.bbox_crs = crs;
        self
    }

    pub fn with_target_crs(mut self, crs: Crs) -> Self {
        self.target_crs = crs;
        self
    }

    pub fn with_pixel_size(mut self, pixel_size: f64) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Label used to scope log lines, `city/year`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.city, self.year)
    }

    pub fn year_dir(&self) -> PathBuf {
        self.output_dir.join(self.year.to_string())
    }

    /// `<output_dir>/<year>/<city>_<year>.tiff`
    pub fn output_path(&self) -> PathBuf {
        self.year_dir()
            .join(format!("{}_{}.tiff", self.city, self.year))
    }

    pub(crate) fn validate(&self) -> Result<(), MosaicError> {
        let city_ok = !self.city.is_empty()
            && self
                .city
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
        if !city_ok {
            return Err(MosaicError::InvalidRequest(format!(
                "city name '{}' must be a non-empty word of letters, digits, '-' or '_'",
                self.city
            )));
        }
        if !(self.pixel_size.is_finite() && self.pixel_size > 0.0) {
            return Err(MosaicError::InvalidRequest(format!(
                "pixel size must be positive, got {}",
                self.pixel_size
            )));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(MosaicError::InvalidRequest(format!(
                "padding must be zero or more, got {}",
                self.padding
            )));
        }
        if !(self.bbox.width() > 0.0 && self.bbox.height() > 0.0) {
            return Err(MosaicError::InvalidRequest(format!(
                "bounding box {} is empty",
                self.bbox
            )));
        }
        Ok(())
    }
}
