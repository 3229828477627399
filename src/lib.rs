//! Uploader for the content studio's hosted asset store
//!
//! Streams local image files to the asset-ingestion API and forwards the
//! returned asset document as JSON. Also imports remotely hosted images in
//! batch for the content pipeline.

pub mod app;
pub mod assets;
pub mod error;
pub mod import;
pub mod mime;
pub mod models;

pub use error::{Error, Result};
