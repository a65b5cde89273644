//! Patch extraction configuration.

/// Parameters for [`GridPatchSegmenter`](crate::segment::GridPatchSegmenter).
///
/// ```
/// use geomosaic::config::PatchConfig;
///
/// let config = PatchConfig::default().with_size(350.0, 350.0).with_compress(false);
/// assert_eq!(config.width_m(), 350.0);
/// assert!(!config.compress());
/// assert_eq!(config.jpeg_quality(), 90);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchConfig {
    width_m: f64,
    height_m: f64,
    /// Re-encode each patch as JPEG and drop the TIFF
    compress: bool,
    jpeg_quality: u8,
    /// Rewrite patches that already exist
    overwrite: bool,
}

impl PatchConfig {
    pub const DEFAULT_SIZE_M: f64 = 700.0;
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, width_m: f64, height_m: f64) -> Self {
        self.width_m = width_m;
        self.height_m = height_m;
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Clamped to 1..=100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    pub fn compress(&self) -> bool {
        self.compress
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            width_m: Self::DEFAULT_SIZE_M,
            height_m: Self::DEFAULT_SIZE_M,
            compress: true,
            jpeg_quality: Self::DEFAULT_JPEG_QUALITY,
            overwrite: false,
        }
    }
}
