//! WMTS GetCapabilities parsing.

use std::future::Future;
use std::sync::Arc;

use roxmltree::{Document, Node};

use super::error::MatrixError;
use super::types::TileMatrixGeometry;
use crate::provider::{kvp_url, AsyncHttpClient};

/// Source of tile matrix geometry for a service endpoint.
pub trait CapabilitiesSource: Send + Sync {
    /// Describe zoom level `zoom_level` of `tile_matrix_set` at `endpoint`.
    fn describe_tile_matrix(
        &self,
        endpoint: &str,
        tile_matrix_set: &str,
        zoom_level: &str,
    ) -> impl Future<Output = Result<TileMatrixGeometry, MatrixError>> + Send;
}

/// Reads geometry from a live WMTS capabilities document.
pub struct WmtsCapabilities<C> {
    client: Arc<C>,
}

impl<C: AsyncHttpClient> WmtsCapabilities<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

impl<C: AsyncHttpClient> CapabilitiesSource for WmtsCapabilities<C> {
    async fn describe_tile_matrix(
        &self,
        endpoint: &str,
        tile_matrix_set: &str,
        zoom_level: &str,
    ) -> Result<TileMatrixGeometry, MatrixError> {
        let url = kvp_url(
            endpoint,
            &[
                ("SERVICE", "WMTS"),
                ("REQUEST", "GetCapabilities"),
                ("VERSION", "1.0.0"),
            ],
        )
        .map_err(|e| MatrixError::unavailable(endpoint, e.to_string()))?;

        tracing::debug!(url = %url, "fetching WMTS capabilities");
        let body = self
            .client
            .get(&url)
            .await
            .map_err(|e| MatrixError::unavailable(endpoint, e.to_string()))?;
        let xml = String::from_utf8(body)
            .map_err(|_| MatrixError::unavailable(endpoint, "capabilities are not UTF-8"))?;

        parse_tile_matrix(&xml, tile_matrix_set, zoom_level)
            .map_err(|reason| MatrixError::unavailable(endpoint, reason))
    }
}

/// Extract one TileMatrix from a capabilities document.
///
/// Identifiers match exactly, or numerically on their last `:`-separated
/// segment, so zoom `12` finds `12`, `012` and `EPSG:28992:12`.
pub fn parse_tile_matrix(
    xml: &str,
    tile_matrix_set: &str,
    zoom_level: &str,
) -> Result<TileMatrixGeometry, String> {
    let doc = Document::parse(xml).map_err(|e| format!("malformed capabilities: {e}"))?;

    let set = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "TileMatrixSet")
        .find(|n| child_text(*n, "Identifier") == Some(tile_matrix_set))
        .ok_or_else(|| format!("tile matrix set '{tile_matrix_set}' not advertised"))?;

    let matrix = set
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "TileMatrix")
        .find(|n| child_text(*n, "Identifier").is_some_and(|id| same_identifier(id, zoom_level)))
        .ok_or_else(|| {
            format!("zoom level '{zoom_level}' not found in tile matrix set '{tile_matrix_set}'")
        })?;

    let scale_denominator: f64 = required(matrix, "ScaleDenominator")?;
    let top_left = child_text(matrix, "TopLeftCorner")
        .ok_or("TileMatrix missing TopLeftCorner")
        .and_then(|raw| parse_corner(raw).ok_or("invalid TopLeftCorner"))?;

    Ok(TileMatrixGeometry {
        scale_denominator,
        top_left,
        tile_width: required(matrix, "TileWidth")?,
        tile_height: required(matrix, "TileHeight")?,
        matrix_width: optional(matrix, "MatrixWidth")?,
        matrix_height: optional(matrix, "MatrixHeight")?,
    })
}

fn same_identifier(advertised: &str, wanted: &str) -> bool {
    if advertised == wanted {
        return true;
    }
    let last = advertised.rsplit(':').next().unwrap_or(advertised);
    match (last.parse::<u32>(), wanted.parse::<u32>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn child_text<'a>(node: Node<'a, 'a>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
        .and_then(|child| child.text())
        .map(str::trim)
}

fn required<T: std::str::FromStr>(node: Node<'_, '_>, name: &str) -> Result<T, String> {
    optional(node, name)?.ok_or_else(|| format!("TileMatrix missing {name}"))
}

fn optional<T: std::str::FromStr>(node: Node<'_, '_>, name: &str) -> Result<Option<T>, String> {
    match child_text(node, name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid {name} '{raw}'")),
        None => Ok(None),
    }
}

fn parse_corner(raw: &str) -> Option<(f64, f64)> {
    let mut parts = raw.split_whitespace().map(str::parse::<f64>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) => Some((x, y)),
        _ => None,
    }
}
