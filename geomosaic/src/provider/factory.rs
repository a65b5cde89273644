//! Tile source creation per resolved tile matrix.

use std::sync::Arc;

use super::http::AsyncHttpClient;
use super::types::TileSource;
use super::wmts::WmtsTileSource;
use crate::matrix::TileMatrixDescriptor;

/// Builds the [`TileSource`] for a resolved tile matrix.
///
/// A mosaic build only knows its service after resolution, so the builder
/// takes a factory rather than a ready source.
pub trait TileSourceFactory: Send + Sync {
    type Source: TileSource + 'static;

    fn create(&self, matrix: &TileMatrixDescriptor) -> Self::Source;
}

/// Creates [`WmtsTileSource`]s sharing one HTTP client.
pub struct WmtsSourceFactory<C> {
    client: Arc<C>,
}

impl<C: AsyncHttpClient> WmtsSourceFactory<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

impl<C: AsyncHttpClient + 'static> TileSourceFactory for WmtsSourceFactory<C> {
    type Source = WmtsTileSource<C>;

    fn create(&self, matrix: &TileMatrixDescriptor) -> Self::Source {
        WmtsTileSource::new(Arc::clone(&self.client), matrix)
    }
}
