//! Caching layers in front of the publisher
//!
//! - `CategoryCache`: parsed records per category, each with its own TTL
//! - `DocumentCache`: downloaded workbook shared by all categories
//! - `Clock`: injectable time source for expirations

pub mod category;
pub mod clock;
pub mod document;

pub use category::{CacheEntry, CacheStats, CategoryCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{CachedDocument, DocumentCache};
