//! Transport types and traits.

use std::fmt;
use std::future::Future;

use crate::plan::TileIndex;

/// Errors from a single remote request. All of them are retryable from the
/// fetcher's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Connection, TLS or body read failure
    Http(String),
    /// Non-success HTTP status
    Status { status: u16, url: String },
    /// Request exceeded its timeout
    Timeout,
    /// Response arrived but is not what was asked for
    InvalidResponse(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Http(msg) => write!(f, "HTTP error: {}", msg),
            SourceError::Status { status, url } => write!(f, "HTTP {} from {}", status, url),
            SourceError::Timeout => write!(f, "request timed out"),
            SourceError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// A remote source of encoded tile images for one resolved tile matrix.
///
/// Implementations return the raw response body (JPEG or PNG); decoding
/// happens in the fetcher so decode failures are retried like transport
/// failures.
pub trait TileSource: Send + Sync {
    /// Fetch the encoded image of one tile.
    fn get_tile(&self, tile: TileIndex)
        -> impl Future<Output = Result<Vec<u8>, SourceError>> + Send;

    /// Short name for log lines.
    fn name(&self) -> &str;
}
