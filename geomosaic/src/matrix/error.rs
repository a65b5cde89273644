//! Tile matrix resolution errors.

use thiserror::Error;

/// Errors raised while resolving a tile matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    /// No configured imagery service covers this year.
    #[error("no imagery service configured for year {0}")]
    UnsupportedYear(u16),

    /// The capabilities document could not be fetched or lacks the
    /// requested tile matrix.
    #[error("imagery service {endpoint} unavailable: {reason}")]
    ServiceUnavailable { endpoint: String, reason: String },

    /// The catalog itself is inconsistent.
    #[error("invalid imagery catalog: {0}")]
    InvalidCatalog(String),
}

impl MatrixError {
    pub(crate) fn unavailable(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
