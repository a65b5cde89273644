//! Year-keyed catalog of imagery services.

use std::fmt;
use std::str::FromStr;

use super::error::MatrixError;
use super::types::Delivery;
use crate::geo::{Crs, RD_NEW};

const ARCGIS_ENDPOINT: &str =
    "https://tiles.arcgis.com/tiles/nSZVuSZjHpEZZbRo/arcgis/rest/services/{layer}/MapServer/WMTS";
const PDOK_ENDPOINT: &str = "https://service.pdok.nl/hwh/luchtfotorgb/wmts/v1_0";
const JPEG: &str = "image/jpeg";

/// Expand two-digit survey years (`20` → `2020`).
pub fn normalize_year(year: u16) -> u16 {
    if year < 100 {
        2000 + year
    } else {
        year
    }
}

/// Inclusive range of survey years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub first: u16,
    pub last: u16,
}

impl YearRange {
    pub fn new(first: u16, last: u16) -> Self {
        Self {
            first: first.min(last),
            last: first.max(last),
        }
    }

    pub fn single(year: u16) -> Self {
        Self::new(year, year)
    }

    pub fn contains(&self, year: u16) -> bool {
        (self.first..=self.last).contains(&year)
    }

    pub fn overlaps(&self, other: &YearRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Parses `2016` or `2016-2023`.
impl FromStr for YearRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u16>()
                .map(normalize_year)
                .map_err(|_| format!("invalid year '{}'", v.trim()))
        };
        match s.split_once('-') {
            Some((first, last)) => Ok(Self::new(parse(first)?, parse(last)?)),
            None => Ok(Self::single(parse(s)?)),
        }
    }
}

/// How the zoom level is picked for a requested ground pixel size.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoomSelection {
    /// Always the same TileMatrix identifier.
    Fixed(String),
    /// `(minimum pixel size, identifier)` pairs, coarsest first. The first
    /// entry whose minimum the requested size reaches wins; sizes below every
    /// minimum get the last (finest) entry.
    Thresholds(Vec<(f64, String)>),
}

impl ZoomSelection {
    pub fn thresholds<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (f64, S)>,
        S: Into<String>,
    {
        let mut pairs: Vec<(f64, String)> =
            pairs.into_iter().map(|(m, id)| (m, id.into())).collect();
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));
        Self::Thresholds(pairs)
    }

    /// Parses `1.0:12, 0.5:13, 0.25:14, 0:15`.
    pub fn parse_thresholds(s: &str) -> Result<Self, String> {
        let mut pairs = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (min, id) = entry
                .split_once(':')
                .ok_or_else(|| format!("expected 'pixel_size:zoom', got '{entry}'"))?;
            let min: f64 = min
                .trim()
                .parse()
                .map_err(|_| format!("invalid pixel size '{}'", min.trim()))?;
            pairs.push((min, id.trim().to_string()));
        }
        if pairs.is_empty() {
            return Err("no zoom thresholds given".to_string());
        }
        Ok(Self::thresholds(pairs))
    }

    /// TileMatrix identifier for `pixel_size` metres per pixel.
    pub fn select(&self, pixel_size: f64) -> &str {
        match self {
            ZoomSelection::Fixed(id) => id,
            ZoomSelection::Thresholds(pairs) => pairs
                .iter()
                .find(|(min, _)| pixel_size >= *min)
                .or_else(|| pairs.last())
                .map(|(_, id)| id.as_str())
                .unwrap_or_default(),
        }
    }
}

/// One imagery generation: where to find it and how it is tiled.
///
/// `endpoint` and `layer` may contain `{year}` and `{yy}`; `endpoint` may
/// also contain `{layer}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceTemplate {
    pub name: String,
    pub years: YearRange,
    pub endpoint: String,
    pub layer: String,
    pub tile_matrix_set: String,
    pub crs: Crs,
    pub zoom: ZoomSelection,
    pub format: String,
    pub delivery: Delivery,
}

impl ServiceTemplate {
    pub fn layer_for(&self, year: u16) -> String {
        fill_year(&self.layer, year)
    }

    pub fn endpoint_for(&self, year: u16) -> String {
        fill_year(&self.endpoint, year).replace("{layer}", &self.layer_for(year))
    }
}

fn fill_year(template: &str, year: u16) -> String {
    template
        .replace("{year}", &year.to_string())
        .replace("{yy}", &format!("{:02}", year % 100))
}

/// Year-range lookup table of imagery services.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageryCatalog {
    templates: Vec<ServiceTemplate>,
}

impl ImageryCatalog {
    /// Build a catalog, rejecting overlapping year ranges and duplicate names.
    pub fn new(mut templates: Vec<ServiceTemplate>) -> Result<Self, MatrixError> {
        templates.sort_by_key(|t| t.years.first);
        for pair in templates.windows(2) {
            if pair[0].years.overlaps(&pair[1].years) {
                return Err(MatrixError::InvalidCatalog(format!(
                    "services '{}' ({}) and '{}' ({}) overlap",
                    pair[0].name, pair[0].years, pair[1].name, pair[1].years
                )));
            }
        }
        for (i, t) in templates.iter().enumerate() {
            if templates[i + 1..].iter().any(|o| o.name == t.name) {
                return Err(MatrixError::InvalidCatalog(format!(
                    "duplicate service name '{}'",
                    t.name
                )));
            }
        }
        Ok(Self { templates })
    }

    /// Dutch national aerial photography, 2008 onwards.
    ///
    /// Older generations come from the ArcGIS Online mirror at a fixed zoom
    /// and need no reprojection; PDOK's 25 cm orthophotos (2016+) pick a zoom
    /// level from the requested pixel size and are resampled afterwards.
    pub fn netherlands() -> Self {
        let arcgis = |name: &str, years: YearRange, layer: &str| ServiceTemplate {
            name: name.to_string(),
            years,
            endpoint: ARCGIS_ENDPOINT.to_string(),
            layer: layer.to_string(),
            tile_matrix_set: "default028mm".to_string(),
            crs: RD_NEW,
            zoom: ZoomSelection::Fixed("12".to_string()),
            format: JPEG.to_string(),
            delivery: Delivery::Rename,
        };

        Self {
            templates: vec![
                arcgis("arcgis-2008", YearRange::single(2008), "Luchtfoto_2008"),
                arcgis(
                    "arcgis-50cm",
                    YearRange::new(2012, 2013),
                    "LuchtfotoNL50cm_{year}",
                ),
                arcgis(
                    "arcgis-2014",
                    YearRange::single(2014),
                    "LuchtfotoNL_50_cm_2014",
                ),
                arcgis(
                    "arcgis-2015",
                    YearRange::single(2015),
                    "LuchtfotoNL_2015_50_cm",
                ),
                ServiceTemplate {
                    name: "pdok".to_string(),
                    years: YearRange::new(2016, 2023),
                    endpoint: PDOK_ENDPOINT.to_string(),
                    layer: "{year}_ortho25".to_string(),
                    tile_matrix_set: "EPSG:28992".to_string(),
                    crs: RD_NEW,
                    zoom: ZoomSelection::thresholds([
                        (1.0, "12"),
                        (0.5, "13"),
                        (0.25, "14"),
                        (0.0, "15"),
                    ]),
                    format: JPEG.to_string(),
                    delivery: Delivery::Warp,
                },
            ],
        }
    }

    pub fn templates(&self) -> &[ServiceTemplate] {
        &self.templates
    }

    pub fn template(&self, name: &str) -> Option<&ServiceTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Replace the template of the same name, or add it.
    pub fn upsert(&mut self, template: ServiceTemplate) -> Result<(), MatrixError> {
        let mut templates: Vec<ServiceTemplate> = self
            .templates
            .iter()
            .filter(|t| t.name != template.name)
            .cloned()
            .collect();
        templates.push(template);
        *self = Self::new(templates)?;
        Ok(())
    }

    /// The service covering `year` (two-digit years accepted).
    pub fn template_for(&self, year: u16) -> Result<&ServiceTemplate, MatrixError> {
        let year = normalize_year(year);
        self.templates
            .iter()
            .find(|t| t.years.contains(year))
            .ok_or(MatrixError::UnsupportedYear(year))
    }
}

impl Default for ImageryCatalog {
    fn default() -> Self {
        Self::netherlands()
    }
}
