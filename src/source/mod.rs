//! Publisher access: link discovery and transport

pub mod fetcher;
pub mod link;

pub use fetcher::{HttpSource, SourceFetcher};
pub use link::{LinkResolver, ResolvedLink};
