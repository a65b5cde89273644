//! Tile and document transport.
//!
//! The fetcher only sees the [`TileSource`] trait, so tests can substitute an
//! in-memory source. The production path is [`WmtsTileSource`] over an
//! [`AsyncHttpClient`], normally [`AsyncReqwestClient`], created per build by
//! a [`TileSourceFactory`].

mod factory;
pub(crate) mod http;
mod types;
mod wmts;

pub use factory::{TileSourceFactory, WmtsSourceFactory};
pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use types::{SourceError, TileSource};
pub use wmts::{kvp_url, WmtsTileSource};
