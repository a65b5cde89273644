use thiserror::Error;

use crate::provider::SourceError;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("feature service request failed: {0}")]
    Request(#[from] SourceError),

    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("feature {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },

    #[error("unexpected feature service response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
