//! Shared workbook cache: fetch once, parse many
//!
//! All categories live in one workbook. Slots are keyed by the resolved
//! document path, so a republication (new path) is always downloaded while
//! concurrent refreshes of different categories share a single download.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::clock::Clock;
use crate::error::IngestResult;

/// A downloaded workbook
#[derive(Debug)]
pub struct CachedDocument {
    pub path: String,
    pub bytes: Arc<[u8]>,
    pub fetched_at: DateTime<Utc>,
}

type Slot = Arc<Mutex<Option<Arc<CachedDocument>>>>;

/// In-flight guard and short-lived store for downloaded workbooks
#[derive(Debug)]
pub struct DocumentCache {
    retention: chrono::Duration,
    slots: DashMap<String, Slot>,
    clock: Arc<dyn Clock>,
}

impl DocumentCache {
    pub fn new(retention: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            retention: chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX),
            slots: DashMap::new(),
            clock,
        }
    }

    fn is_fresh(&self, document: &CachedDocument) -> bool {
        self.clock.now() - document.fetched_at < self.retention
    }

    /// Return the workbook at `path`, calling `fetch` only when no fresh copy
    /// exists. Callers for the same path wait for the download in flight.
    pub async fn get_or_fetch<F, Fut>(&self, path: &str, fetch: F) -> IngestResult<Arc<CachedDocument>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = IngestResult<Vec<u8>>>,
    {
        let slot: Slot = self.slots.entry(path.to_string()).or_default().clone();
        let mut guard = slot.lock().await;

        if let Some(document) = guard.as_ref() {
            if self.is_fresh(document) {
                debug!(path, "Reusing downloaded document");
                return Ok(Arc::clone(document));
            }
        }

        let bytes = fetch().await?;
        let document = Arc::new(CachedDocument {
            path: path.to_string(),
            bytes: bytes.into(),
            fetched_at: self.clock.now(),
        });
        debug!(path, bytes = document.bytes.len(), "Downloaded document");
        *guard = Some(Arc::clone(&document));
        drop(guard);

        self.prune();
        Ok(document)
    }

    /// Drop idle slots that are empty or expired
    fn prune(&self) {
        self.slots.retain(|_, slot| match slot.try_lock() {
            Ok(guard) => guard.as_ref().is_some_and(|document| self.is_fresh(document)),
            // A download is in flight
            Err(_) => true,
        });
    }

    /// Number of documents currently held
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
