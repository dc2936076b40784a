//! Publisher endpoint and HTTP client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::DEFAULT_USER_AGENT;

/// Where the published list lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Landing page that links to the current workbook
    pub landing_url: String,
    /// Host prefix joined with the relative link found on the landing page
    pub document_base_url: String,
    /// Phrase identifying the link to the compensated-medicines list
    pub link_marker: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            landing_url: "http://www.cnam.md/index.php?page=295".to_string(),
            document_base_url: "http://www.cnam.md".to_string(),
            link_marker: "Lista Denumirilor Comerciale compensate".to_string(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent string
    pub user_agent: String,
    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,
    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,
    /// Largest workbook accepted (bytes)
    pub max_document_bytes: usize,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_document_bytes: 50 * 1024 * 1024, // 50 MB
        }
    }
}
