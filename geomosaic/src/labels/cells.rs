//! Scored label cells and their GeoJSON feature form.

use std::collections::BTreeMap;

use geo::{Centroid, Coord, LineString, Polygon};
use geojson::{Feature, JsonObject, JsonValue};

use super::LabelError;
use crate::segment::{CanonicalCell, GridCell};

/// Feature service score columns and the names they are stored under.
pub const SCORE_COLUMNS: [(&str, &str); 6] = [
    ("afw", "liveability"),
    ("fys", "phys_env"),
    ("onv", "safety"),
    ("vrz", "amenities"),
    ("soc", "cohesion"),
    ("won", "buildings"),
];

/// One label grid cell with its renamed scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCell {
    pub id: String,
    pub centroid: (f64, f64),
    pub polygon: Polygon<f64>,
    pub scores: BTreeMap<String, f64>,
}

impl ScoredCell {
    /// Parse a raw feature service feature. Score columns are renamed and
    /// everything else but the id is dropped. `Ok(None)` for a cell with a
    /// missing score.
    pub fn from_service_feature(index: usize, feature: Feature) -> Result<Option<Self>, LabelError> {
        let (id, polygon, centroid, properties) = split_feature(index, feature)?;

        let mut scores = BTreeMap::new();
        for (source, target) in SCORE_COLUMNS {
            match properties.get(source) {
                None => {}
                Some(value) => match number(value) {
                    Some(score) => {
                        scores.insert(target.to_string(), score);
                    }
                    None => return Ok(None),
                },
            }
        }

        Ok(Some(Self {
            id,
            centroid,
            polygon,
            scores,
        }))
    }

    /// Parse a feature written by [`ScoredCell::to_feature`]; every numeric
    /// property other than `id` is taken as a score.
    pub fn from_feature(index: usize, feature: Feature) -> Result<Self, LabelError> {
        let (id, polygon, centroid, properties) = split_feature(index, feature)?;
        let scores = properties
            .iter()
            .filter(|(key, _)| key.as_str() != "id")
            .filter_map(|(key, value)| number(value).map(|n| (key.clone(), n)))
            .collect();
        Ok(Self {
            id,
            centroid,
            polygon,
            scores,
        })
    }

    /// Replace the polygon with the full 100 m grid square of its centroid.
    /// The centroid moves to the square's centre.
    pub fn unclip(mut self) -> Self {
        let cell = CanonicalCell::from_centroid(self.centroid);
        let ring: Vec<Coord<f64>> = cell.ring().into_iter().map(Coord::from).collect();
        self.polygon = Polygon::new(LineString::new(ring), vec![]);
        self.centroid = cell.center();
        self
    }

    pub fn to_grid_cell(&self) -> GridCell {
        GridCell::new(self.id.clone(), self.centroid)
    }

    pub fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("id".into(), JsonValue::from(self.id.clone()));
        for (name, score) in &self.scores {
            properties.insert(name.clone(), JsonValue::from(*score));
        }
        Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.polygon))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

type FeatureParts = (String, Polygon<f64>, (f64, f64), JsonObject);

fn split_feature(index: usize, feature: Feature) -> Result<FeatureParts, LabelError> {
    let invalid = |reason: &str| LabelError::InvalidFeature {
        index,
        reason: reason.to_string(),
    };

    let properties = feature.properties.unwrap_or_default();
    let id = match properties.get("id") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => match feature.id {
            Some(geojson::feature::Id::String(s)) => s,
            Some(geojson::feature::Id::Number(n)) => n.to_string(),
            None => return Err(invalid("no id")),
        },
    };

    let geometry = feature.geometry.ok_or_else(|| invalid("no geometry"))?;
    let geometry = geo::Geometry::<f64>::try_from(geometry)?;
    let centroid = geometry
        .centroid()
        .ok_or_else(|| invalid("empty geometry"))?;
    let polygon = match geometry {
        geo::Geometry::Polygon(p) => p,
        geo::Geometry::MultiPolygon(mp) => mp
            .0
            .into_iter()
            .next()
            .ok_or_else(|| invalid("empty multipolygon"))?,
        _ => return Err(invalid("not a polygon")),
    };

    Ok((id, polygon, (centroid.x(), centroid.y()), properties))
}

fn number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
