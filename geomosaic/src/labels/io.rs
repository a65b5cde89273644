//! GeoJSON files of label cells.

use std::path::Path;

use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue};

use super::cells::ScoredCell;
use super::LabelError;
use crate::segment::GridCell;

/// Read grid cells for patch extraction from a GeoJSON feature collection.
/// Only `id` and the geometry centroid are used.
pub fn read_grid_cells(path: impl AsRef<Path>) -> Result<Vec<GridCell>, LabelError> {
    Ok(read_scored_cells(path)?
        .iter()
        .map(ScoredCell::to_grid_cell)
        .collect())
}

pub fn read_scored_cells(path: impl AsRef<Path>) -> Result<Vec<ScoredCell>, LabelError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(LabelError::InvalidResponse(
                "expected features, found a bare geometry".into(),
            ))
        }
    };
    features
        .into_iter()
        .enumerate()
        .map(|(i, f)| ScoredCell::from_feature(i, f))
        .collect()
}

/// Write cells as a GeoJSON feature collection tagged with the RD New CRS.
pub fn write_scored_cells(path: impl AsRef<Path>, cells: &[ScoredCell]) -> Result<(), LabelError> {
    let collection = FeatureCollection {
        bbox: None,
        features: cells.iter().map(ScoredCell::to_feature).collect(),
        foreign_members: Some(rd_new_crs_member()),
    };
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path.as_ref(), GeoJson::from(collection).to_string())?;
    Ok(())
}

/// Legacy named-CRS member GDAL reads and writes for non-WGS84 GeoJSON.
fn rd_new_crs_member() -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert(
        "name".into(),
        JsonValue::from("urn:ogc:def:crs:EPSG::28992"),
    );
    let mut crs = JsonObject::new();
    crs.insert("type".into(), JsonValue::from("name"));
    crs.insert("properties".into(), JsonValue::Object(properties));

    let mut members = JsonObject::new();
    members.insert("crs".into(), JsonValue::Object(crs));
    members
}
