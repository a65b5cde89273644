//! EPSG-coded reference systems and point reprojection.

use std::fmt;
use std::str::FromStr;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use thiserror::Error;

/// Amersfoort / RD New, the Dutch national grid.
pub const RD_NEW: Crs = Crs(28992);

/// OGC WKT of [`RD_NEW`], embedded in patch files.
pub const RD_NEW_WKT: &str = r#"PROJCS["Amersfoort / RD New",GEOGCS["Amersfoort",DATUM["Amersfoort",SPHEROID["Bessel 1841",6377397.155,299.1528128,AUTHORITY["EPSG","7004"]],TOWGS84[565.417,50.3319,465.552,-0.398957,0.343988,-1.8774,4.0725],AUTHORITY["EPSG","6289"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4289"]],PROJECTION["Oblique_Stereographic"],PARAMETER["latitude_of_origin",52.15616055555555],PARAMETER["central_meridian",5.38763888888889],PARAMETER["scale_factor",0.9999079],PARAMETER["false_easting",155000],PARAMETER["false_northing",463000],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["X",EAST],AXIS["Y",NORTH],AUTHORITY["EPSG","28992"]]"#;

/// A coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Crs(pub u32);

/// Errors from CRS parsing and reprojection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrsError {
    #[error("invalid CRS identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("{0} is not in the EPSG database")]
    UnknownCode(Crs),

    #[error("cannot build projection for {crs}: {reason}")]
    InvalidProjection { crs: Crs, reason: String },

    #[error("transform from {from} to {to} failed at ({x}, {y}): {reason}")]
    TransformFailed {
        from: Crs,
        to: Crs,
        x: f64,
        y: f64,
        reason: String,
    },
}

impl Crs {
    /// The EPSG code.
    pub fn code(&self) -> u32 {
        self.0
    }

    /// PROJ string for this code, if the EPSG database knows it.
    pub fn proj_string(&self) -> Option<&'static str> {
        u16::try_from(self.0)
            .ok()
            .and_then(crs_definitions::from_code)
            .map(|def| def.proj4)
    }

    /// Whether coordinates are longitude/latitude degrees rather than map units.
    pub fn is_geographic(&self) -> bool {
        match self.proj_string() {
            Some(proj) => proj.contains("+proj=longlat"),
            None => self.0 == 4326,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// Accepts `28992`, `EPSG:28992`, `urn:ogc:def:crs:EPSG::28992` and
/// `urn:ogc:def:crs:EPSG:6.18:3:28992` (the form WMTS capabilities use).
impl FromStr for Crs {
    type Err = CrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !trimmed.to_ascii_uppercase().contains("EPSG") && trimmed.parse::<u32>().is_err() {
            return Err(CrsError::InvalidIdentifier(s.to_string()));
        }
        trimmed
            .rsplit(':')
            .next()
            .and_then(|code| code.trim().parse::<u32>().ok())
            .map(Crs)
            .ok_or_else(|| CrsError::InvalidIdentifier(s.to_string()))
    }
}

/// A reusable point transformer between two reference systems.
///
/// Building the `Proj` pair parses the PROJ strings once; `project` can then
/// be called per pixel. Identity transforms skip `proj4rs` entirely.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    projs: Option<(Proj, Proj)>,
}

impl Reprojector {
    pub fn new(from: Crs, to: Crs) -> Result<Self, CrsError> {
        if from == to {
            return Ok(Self {
                from,
                to,
                projs: None,
            });
        }
        Ok(Self {
            from,
            to,
            projs: Some((build_proj(from)?, build_proj(to)?)),
        })
    }

    pub fn is_identity(&self) -> bool {
        self.projs.is_none()
    }

    /// Transform one point, taking degrees for geographic systems.
    pub fn project(&self, x: f64, y: f64) -> Result<(f64, f64), CrsError> {
        let Some((src, dst)) = &self.projs else {
            return Ok((x, y));
        };

        // proj4rs works in radians for geographic systems
        let mut point = if self.from.is_geographic() {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(src, dst, &mut point).map_err(|e| CrsError::TransformFailed {
            from: self.from,
            to: self.to,
            x,
            y,
            reason: format!("{e:?}"),
        })?;

        if !point.0.is_finite() || !point.1.is_finite() {
            return Err(CrsError::TransformFailed {
                from: self.from,
                to: self.to,
                x,
                y,
                reason: "non-finite result".to_string(),
            });
        }

        if self.to.is_geographic() {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }
}

fn build_proj(crs: Crs) -> Result<Proj, CrsError> {
    let proj_string = crs.proj_string().ok_or(CrsError::UnknownCode(crs))?;
    Proj::from_proj_string(proj_string).map_err(|e| CrsError::InvalidProjection {
        crs,
        reason: format!("{e:?}"),
    })
}
