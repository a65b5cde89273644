//! WMTS GetTile over KVP.

use std::sync::Arc;

use super::http::AsyncHttpClient;
use super::types::{SourceError, TileSource};
use crate::matrix::TileMatrixDescriptor;
use crate::plan::TileIndex;

/// Build a KVP request URL: `endpoint?k1=v1&k2=v2`, percent-encoding values.
///
/// A trailing `?` or `/` on the endpoint is dropped first.
pub fn kvp_url(endpoint: &str, params: &[(&str, &str)]) -> Result<String, SourceError> {
    let base = endpoint.trim_end_matches(['?', '/']);
    reqwest::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| SourceError::InvalidResponse(format!("invalid endpoint '{endpoint}': {e}")))
}

/// Fetches tiles of one layer / matrix set / zoom level from a WMTS service.
pub struct WmtsTileSource<C> {
    client: Arc<C>,
    name: String,
    endpoint: String,
    layer: String,
    tile_matrix_set: String,
    zoom_level: String,
    format: String,
}

impl<C: AsyncHttpClient> WmtsTileSource<C> {
    pub fn new(client: Arc<C>, descriptor: &TileMatrixDescriptor) -> Self {
        Self {
            client,
            name: format!("{}@{}", descriptor.layer_name, descriptor.zoom_level),
            endpoint: descriptor.endpoint.clone(),
            layer: descriptor.layer_name.clone(),
            tile_matrix_set: descriptor.tile_matrix_set.clone(),
            zoom_level: descriptor.zoom_level.clone(),
            format: descriptor.format.clone(),
        }
    }

    pub fn tile_url(&self, tile: TileIndex) -> Result<String, SourceError> {
        let row = tile.row.to_string();
        let col = tile.col.to_string();
        kvp_url(
            &self.endpoint,
            &[
                ("SERVICE", "WMTS"),
                ("REQUEST", "GetTile"),
                ("VERSION", "1.0.0"),
                ("LAYER", &self.layer),
                ("STYLE", "default"),
                ("TILEMATRIXSET", &self.tile_matrix_set),
                ("TILEMATRIX", &self.zoom_level),
                ("TILEROW", &row),
                ("TILECOL", &col),
                ("FORMAT", &self.format),
            ],
        )
    }
}

impl<C: AsyncHttpClient> TileSource for WmtsTileSource<C> {
    async fn get_tile(&self, tile: TileIndex) -> Result<Vec<u8>, SourceError> {
        let url = self.tile_url(tile)?;
        let body = self.client.get(&url).await?;
        if body.starts_with(b"<?xml") || body.starts_with(b"<Exception") {
            return Err(SourceError::InvalidResponse(format!(
                "service exception for tile {tile}"
            )));
        }
        Ok(body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
