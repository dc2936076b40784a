//! Error kinds surfaced by the ingestion pipeline

use thiserror::Error;

/// Errors that abort a refresh attempt.
///
/// Per-cell anomalies never reach this type; they degrade to field defaults
/// inside the record mapper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Network or transport failure, or a non-success HTTP status
    #[error("fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// Download link missing from the landing page, or not usable
    #[error("download link not found: {0}")]
    LinkNotFound(String),

    /// Link found but its text carries no publish date
    #[error("publish date not found in link text {0:?}")]
    DateNotFound(String),

    /// Workbook cannot be decoded or lacks the requested sheet
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Category has no configured sheet/TTL mapping
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

impl IngestError {
    pub(crate) fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for pipeline operations
pub type IngestResult<T> = Result<T, IngestError>;
