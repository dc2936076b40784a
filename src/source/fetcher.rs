//! Transport for the landing page and the workbook
//!
//! One GET per call, no retries. Timeouts come from configuration so a
//! stalled publisher cannot hang a refresh indefinitely.

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Instant;
use tracing::debug;
use url::Url;

use crate::config::{HttpConfig, SourceConfig};
use crate::error::{IngestError, IngestResult};

/// The two network fetches a refresh depends on
#[async_trait]
pub trait SourceFetcher: Send + Sync + Debug {
    /// Fetch the landing page that links to the current workbook
    async fn fetch_landing_page(&self) -> IngestResult<String>;

    /// Fetch the workbook at `path`, as resolved from the landing page
    async fn fetch_document(&self, path: &str) -> IngestResult<Vec<u8>>;
}

/// `reqwest`-backed fetcher for the publisher host
#[derive(Debug, Clone)]
pub struct HttpSource {
    http_client: reqwest::Client,
    landing_url: Url,
    document_base_url: Url,
    max_document_bytes: usize,
}

impl HttpSource {
    pub fn new(source: &SourceConfig, http: &HttpConfig) -> IngestResult<Self> {
        let landing_url = Url::parse(&source.landing_url)
            .map_err(|e| IngestError::fetch(&source.landing_url, e))?;
        let document_base_url = Url::parse(&source.document_base_url)
            .map_err(|e| IngestError::fetch(&source.document_base_url, e))?;

        let http_client = reqwest::Client::builder()
            .timeout(http.timeout())
            .connect_timeout(http.connect_timeout())
            .user_agent(&http.user_agent)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| IngestError::fetch(landing_url.as_str(), e))?;

        Ok(Self {
            http_client,
            landing_url,
            document_base_url,
            max_document_bytes: http.max_document_bytes,
        })
    }

    /// Absolute URL of a document path found on the landing page
    pub fn document_url(&self, path: &str) -> IngestResult<Url> {
        self.document_base_url
            .join(path)
            .map_err(|e| IngestError::fetch(path, format!("invalid document path: {}", e)))
    }

    async fn get(&self, url: &Url) -> IngestResult<reqwest::Response> {
        let start = Instant::now();
        let response = self
            .http_client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| IngestError::fetch(url.as_str(), e))?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), elapsed_ms = start.elapsed().as_millis() as u64, "GET");
        if !status.is_success() {
            return Err(IngestError::fetch(url.as_str(), format!("HTTP status {}", status)));
        }
        Ok(response)
    }
}

#[async_trait]
impl SourceFetcher for HttpSource {
    async fn fetch_landing_page(&self) -> IngestResult<String> {
        self.get(&self.landing_url)
            .await?
            .text()
            .await
            .map_err(|e| IngestError::fetch(self.landing_url.as_str(), e))
    }

    async fn fetch_document(&self, path: &str) -> IngestResult<Vec<u8>> {
        let url = self.document_url(path)?;
        let response = self.get(&url).await?;

        let too_large = |len: usize| {
            IngestError::fetch(
                url.as_str(),
                format!("document too large: {} bytes (limit {})", len, self.max_document_bytes),
            )
        };

        if let Some(len) = response.content_length() {
            if len as usize > self.max_document_bytes {
                return Err(too_large(len as usize));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IngestError::fetch(url.as_str(), e))?;

        if body.len() > self.max_document_bytes {
            return Err(too_large(body.len()));
        }

        Ok(body.to_vec())
    }
}
