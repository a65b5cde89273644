//! HTTP client abstraction for testability

use super::types::SourceError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Asynchronous HTTP GET.
///
/// Abstracted so capabilities parsing, tile fetching and the label client can
/// be tested against canned responses.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request and returns the body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, SourceError>> + Send;
}

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("geomosaic/", env!("CARGO_PKG_VERSION"));

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with a 30 second request timeout.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a client with a custom request timeout.
    ///
    /// A small connection pool is enough: the fetcher never has more than a
    /// handful of requests in flight per host.
    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) if e.is_timeout() => {
                debug!(url = url, "HTTP request timed out");
                return Err(SourceError::Timeout);
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    "HTTP request failed"
                );
                return Err(SourceError::Http(format!("Request failed: {}", e)));
            }
        };

        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => Err(SourceError::Http(format!("Failed to read response: {}", e))),
        }
    }
}
