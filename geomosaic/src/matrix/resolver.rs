//! Year + pixel size → tile matrix descriptor.

use super::capabilities::CapabilitiesSource;
use super::catalog::{normalize_year, ImageryCatalog};
use super::error::MatrixError;
use super::types::TileMatrixDescriptor;

/// Resolves tile matrices against a catalog and a capabilities source.
pub struct TileMatrixResolver<S> {
    catalog: ImageryCatalog,
    source: S,
}

impl<S: CapabilitiesSource> TileMatrixResolver<S> {
    pub fn new(catalog: ImageryCatalog, source: S) -> Self {
        Self { catalog, source }
    }

    pub fn catalog(&self) -> &ImageryCatalog {
        &self.catalog
    }

    /// Resolve the tile matrix for `year` at `pixel_size` metres per pixel.
    ///
    /// The catalog lookup happens first, so an unsupported year returns
    /// [`MatrixError::UnsupportedYear`] without any network call. The one
    /// capabilities request that follows surfaces its failures as
    /// [`MatrixError::ServiceUnavailable`].
    pub async fn resolve(
        &self,
        year: u16,
        pixel_size: f64,
    ) -> Result<TileMatrixDescriptor, MatrixError> {
        let year = normalize_year(year);
        let template = self.catalog.template_for(year)?;

        let endpoint = template.endpoint_for(year);
        let zoom_level = template.zoom.select(pixel_size).to_string();
        let geometry = self
            .source
            .describe_tile_matrix(&endpoint, &template.tile_matrix_set, &zoom_level)
            .await?;

        if geometry.tile_width == 0 || geometry.tile_height == 0 {
            return Err(MatrixError::unavailable(&endpoint, "zero tile size advertised"));
        }
        if !(geometry.scale_denominator.is_finite() && geometry.scale_denominator > 0.0) {
            return Err(MatrixError::unavailable(
                &endpoint,
                format!("invalid scale denominator {}", geometry.scale_denominator),
            ));
        }

        Ok(TileMatrixDescriptor {
            endpoint,
            layer_name: template.layer_for(year),
            tile_matrix_set: template.tile_matrix_set.clone(),
            zoom_level,
            crs: template.crs,
            format: template.format.clone(),
            delivery: template.delivery,
            geometry,
        })
    }
}
