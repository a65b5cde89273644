//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`mosaic`] - Build one city/year mosaic from WMTS tiles
//! - [`patches`] - Cut a mosaic into grid-cell patches
//! - [`labels`] - Fetch scored grid cells from the label service

pub mod labels;
pub mod mosaic;
pub mod patches;
