//! Configuration for the ingestion pipeline

mod cache;
mod logging;
mod source;

pub use cache::{CacheConfig, CategoriesConfig, CategorySettings};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use source::{HttpConfig, SourceConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use url::Url;

use crate::types::Category;

/// Default user agent for all outbound requests
pub const DEFAULT_USER_AGENT: &str = concat!("compmed/", env!("CARGO_PKG_VERSION"));

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Publisher endpoint
    #[serde(default)]
    pub source: SourceConfig,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Shared document cache
    #[serde(default)]
    pub cache: CacheConfig,
    /// Sheet position and TTL per category
    #[serde(default = "cache::default_categories")]
    pub categories: CategoriesConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            http: HttpConfig::default(),
            cache: CacheConfig::default(),
            categories: cache::default_categories(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {}", path.display(), e))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects every error and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Source validation
        for (name, value) in [
            ("landing_url", &self.source.landing_url),
            ("document_base_url", &self.source.document_base_url),
        ] {
            match Url::parse(value) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                Ok(url) => errors.push(format!(
                    "{} must use http or https, got scheme '{}'",
                    name,
                    url.scheme()
                )),
                Err(e) => errors.push(format!("{} is not a valid URL: {}", name, e)),
            }
        }
        if self.source.link_marker.trim().is_empty() {
            errors.push("link_marker must not be empty".to_string());
        }

        // HTTP validation
        if self.http.timeout_secs == 0 {
            errors.push("timeout_secs must be positive".to_string());
        }
        if self.http.connect_timeout_secs == 0 {
            errors.push("connect_timeout_secs must be positive".to_string());
        }
        if self.http.max_document_bytes == 0 {
            errors.push("max_document_bytes must be positive".to_string());
        }

        // Category validation
        let mut sheets: HashMap<usize, &str> = HashMap::new();
        for (name, settings) in &self.categories {
            if name.parse::<Category>().is_err() {
                errors.push(format!("unknown category '{}'", name));
            }
            if settings.ttl_secs == 0 {
                errors.push(format!("ttl_secs for '{}' must be positive", name));
            }
            if let Some(other) = sheets.insert(settings.sheet, name) {
                errors.push(format!(
                    "categories '{}' and '{}' both use sheet {}",
                    other, name, settings.sheet
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }

    /// Category table with names resolved; unparseable names are dropped.
    pub fn category_table(&self) -> BTreeMap<Category, CategorySettings> {
        self.categories
            .iter()
            .filter_map(|(name, settings)| Some((name.parse::<Category>().ok()?, *settings)))
            .collect()
    }
}
