//! On-disk document models and layout constants for flowmcp.
//!
//! This crate defines the documents shared by the config store, schema
//! catalog, and cache engine: what lives in the global and project config
//! files, what a schema module declares, and how a cache entry is laid out.

pub mod models;
pub mod schema;

pub use models::*;
