//! Cache lifetimes and category layout

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::Category;

/// Shared document cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a downloaded workbook is reused by other categories (seconds)
    pub document_retention_secs: u64,
}

impl CacheConfig {
    pub fn document_retention(&self) -> Duration {
        Duration::from_secs(self.document_retention_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            document_retention_secs: 6 * 60 * 60,
        }
    }
}

/// Sheet position and freshness window for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySettings {
    /// Zero-based sheet position in the workbook
    pub sheet: usize,
    /// Time-to-live of the cached records (seconds)
    pub ttl_secs: u64,
}

impl CategorySettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Category table keyed by category name (`fully_compensated`, ...).
///
/// A category absent from the table is unknown to the pipeline.
pub type CategoriesConfig = BTreeMap<String, CategorySettings>;

pub(crate) fn default_categories() -> CategoriesConfig {
    let hours = |h: u64| h * 60 * 60;
    [
        (Category::FullyCompensated, 0, hours(6)),
        (Category::PartiallyCompensated, 1, hours(24)),
        (Category::Pandemic, 2, hours(7 * 24)),
    ]
    .into_iter()
    .map(|(category, sheet, ttl_secs)| {
        (category.as_str().to_string(), CategorySettings { sheet, ttl_secs })
    })
    .collect()
}
