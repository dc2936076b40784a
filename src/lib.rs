//! compmed: ingestion pipeline for the published list of compensated medicines
//!
//! The publisher republishes a hand-maintained workbook at a new address each
//! cycle. This crate:
//! - discovers the current download link and its publish date on the landing page
//! - downloads the workbook once and shares it between categories
//! - maps each sheet's rows to typed records, tolerating shifted or respelled headers
//! - caches the records per category with independent expirations

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod sheet;
pub mod source;
pub mod types;

pub use cache::CategoryCache;
pub use config::Config;
pub use error::{IngestError, IngestResult};
pub use types::*;
