//! Paginated WFS client for scored label cells.

use std::sync::Arc;

use geojson::GeoJson;
use tracing::debug;

use super::cells::ScoredCell;
use super::LabelError;
use crate::geo::BoundingBox;
use crate::matrix::normalize_year;
use crate::provider::{kvp_url, AsyncHttpClient};

pub const DEFAULT_WFS_URL: &str = "https://geo.leefbaarometer.nl/lbm3/ows";
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Fetches the clipped grid score layer of one year from the feature
/// service, page by page.
pub struct WfsLabelClient<C> {
    client: Arc<C>,
    url: String,
    page_size: usize,
}

impl<C: AsyncHttpClient> WfsLabelClient<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            url: DEFAULT_WFS_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Zero is raised to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Feature type holding the scores of `year`, e.g.
    /// `lbm3:clippedgridscore20`.
    pub fn type_name(year: u16) -> String {
        format!("lbm3:clippedgridscore{:02}", normalize_year(year) % 100)
    }

    pub fn page_url(
        &self,
        year: u16,
        bbox: &BoundingBox,
        start_index: usize,
    ) -> Result<String, LabelError> {
        let type_name = Self::type_name(year);
        let bbox = bbox.to_string();
        let count = self.page_size.to_string();
        let start = start_index.to_string();
        Ok(kvp_url(
            &self.url,
            &[
                ("service", "WFS"),
                ("version", "2.0.0"),
                ("request", "GetFeature"),
                ("typeNames", &type_name),
                ("outputFormat", "json"),
                ("srsName", "EPSG:28992"),
                ("bbox", &bbox),
                ("count", &count),
                ("startIndex", &start),
            ],
        )?)
    }

    /// All scored cells of `year` intersecting `bbox` (RD New), unclipped to
    /// their full grid squares. Cells with a missing score are dropped.
    pub async fn fetch_scored_cells(
        &self,
        year: u16,
        bbox: &BoundingBox,
    ) -> Result<Vec<ScoredCell>, LabelError> {
        let mut cells = Vec::new();
        let mut dropped = 0usize;
        let mut start = 0usize;

        loop {
            let url = self.page_url(year, bbox, start)?;
            let body = self.client.get(&url).await?;
            let text = String::from_utf8(body)
                .map_err(|e| LabelError::InvalidResponse(format!("body is not UTF-8: {e}")))?;
            let features = match text.parse::<GeoJson>()? {
                GeoJson::FeatureCollection(fc) => fc.features,
                _ => {
                    return Err(LabelError::InvalidResponse(
                        "expected a FeatureCollection".into(),
                    ))
                }
            };

            let page_len = features.len();
            debug!(start, page_len, "feature page received");
            for (i, feature) in features.into_iter().enumerate() {
                match ScoredCell::from_service_feature(start + i, feature)? {
                    Some(cell) => cells.push(cell.unclip()),
                    None => dropped += 1,
                }
            }

            if page_len < self.page_size {
                break;
            }
            start += page_len;
        }

        debug!(kept = cells.len(), dropped, "label cells fetched");
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::mock::MockHttpClient;

    fn page(ids: &[u32]) -> String {
        let features: Vec<String> = ids
            .iter()
            .map(|id| {
                let x = 139_000.0 + *id as f64 * 100.0 + 20.0;
                format!(
                    r#"{{"type":"Feature","geometry":{{"type":"Polygon","coordinates":[[[{x},456820.0],[{x2},456820.0],[{x2},456840.0],[{x},456840.0],[{x},456820.0]]]}},"properties":{{"id":{id},"afw":0.5,"won":1.0}}}}"#,
                    x2 = x + 20.0
                )
            })
            .collect();
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new(139_000.0, 456_000.0, 143_000.0, 460_000.0)
    }

    #[test]
    fn test_type_name_uses_two_digit_year() {
        assert_eq!(WfsLabelClient::<MockHttpClient>::type_name(2020), "lbm3:clippedgridscore20");
        assert_eq!(WfsLabelClient::<MockHttpClient>::type_name(8), "lbm3:clippedgridscore08");
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let urls = WfsLabelClient::new(Arc::new(MockHttpClient::new())).with_page_size(2);
        let first = urls.page_url(2020, &bbox(), 0).unwrap();
        let second = urls.page_url(2020, &bbox(), 2).unwrap();
        let third = urls.page_url(2020, &bbox(), 4).unwrap();

        let http = Arc::new(
            MockHttpClient::new()
                .respond(&first, page(&[1, 2]))
                .respond(&second, page(&[3, 4]))
                .respond(&third, page(&[5])),
        );
        let client = WfsLabelClient::new(http.clone()).with_page_size(2);

        let cells = client.fetch_scored_cells(2020, &bbox()).await.unwrap();
        let ids: Vec<&str> = cells.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(http.requests.lock().len(), 3);
        assert_eq!(cells[0].centroid, (139_150.0, 456_850.0));
        assert_eq!(cells[0].scores["buildings"], 1.0);
    }

    #[tokio::test]
    async fn test_service_error_surfaces() {
        let client = WfsLabelClient::new(Arc::new(MockHttpClient::new()));
        assert!(matches!(
            client.fetch_scored_cells(2020, &bbox()).await,
            Err(LabelError::Request(_))
        ));
    }
}
