//! Per-category record cache with independent expirations
//!
//! Each category moves through `Empty -> Populated -> Stale -> Populated`.
//! A refresh resolves the landing page, obtains the workbook through the
//! shared [`DocumentCache`], parses the category's sheet and replaces the
//! entry wholesale. A failed refresh leaves the previous entry untouched.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::document::DocumentCache;
use crate::config::{CategorySettings, Config};
use crate::error::{IngestError, IngestResult};
use crate::sheet::SpreadsheetParser;
use crate::source::{HttpSource, LinkResolver, ResolvedLink, SourceFetcher};
use crate::types::{Category, MedicationRecord};

/// Parsed records of one category and when they expire
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub category: Category,
    pub records: Arc<[MedicationRecord]>,
    pub inserted_at: DateTime<Utc>,
    pub ttl: chrono::Duration,
    /// Link the records were parsed from
    pub source: ResolvedLink,
}

impl CacheEntry {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.inserted_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Stale strictly after `inserted_at + ttl`
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls answered from a live entry
    pub hits: u64,
    /// Successful refreshes (one parse each)
    pub refreshes: u64,
    /// Refreshes that ended in an error
    pub failures: u64,
}

/// Serializes refreshes of one category.
///
/// `completed` counts finished refreshes so a caller that waited on the lock
/// can tell whether someone else refreshed meanwhile, and share its outcome.
#[derive(Debug, Default)]
struct RefreshSlot {
    completed: AtomicU64,
    last_error: Mutex<Option<IngestError>>,
}

/// Process-scoped cache in front of the ingestion pipeline
#[derive(Debug)]
pub struct CategoryCache {
    fetcher: Arc<dyn SourceFetcher>,
    resolver: LinkResolver,
    parser: SpreadsheetParser,
    categories: BTreeMap<Category, CategorySettings>,
    documents: DocumentCache,
    entries: RwLock<HashMap<Category, Arc<CacheEntry>>>,
    refreshes: DashMap<Category, Arc<RefreshSlot>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    refresh_count: AtomicU64,
    failures: AtomicU64,
}

impl CategoryCache {
    /// Create a cache over the publisher's HTTP endpoint
    pub fn from_config(config: &Config) -> IngestResult<Self> {
        let fetcher = HttpSource::new(&config.source, &config.http)?;
        Ok(Self::new(Arc::new(fetcher), config))
    }

    /// Create a cache over any fetcher, using the wall clock
    pub fn new(fetcher: Arc<dyn SourceFetcher>, config: &Config) -> Self {
        Self::with_clock(fetcher, config, Arc::new(SystemClock))
    }

    pub fn with_clock(fetcher: Arc<dyn SourceFetcher>, config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            resolver: LinkResolver::new(config.source.link_marker.clone()),
            parser: SpreadsheetParser,
            categories: config.category_table(),
            documents: DocumentCache::new(config.cache.document_retention(), Arc::clone(&clock)),
            entries: RwLock::new(HashMap::new()),
            refreshes: DashMap::new(),
            clock,
            hits: AtomicU64::new(0),
            refresh_count: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Records for `category`, refreshed from the publisher when the cached
    /// entry is missing or stale.
    pub async fn get_records(&self, category: Category) -> IngestResult<Arc<[MedicationRecord]>> {
        let settings = *self
            .categories
            .get(&category)
            .ok_or_else(|| IngestError::UnknownCategory(category.to_string()))?;

        if let Some(records) = self.live_records(category) {
            return Ok(records);
        }

        let slot: Arc<RefreshSlot> = self.refreshes.entry(category).or_default().clone();
        let seen = slot.completed.load(Ordering::Acquire);
        let mut last_error = slot.last_error.lock().await;

        if let Some(records) = self.live_records(category) {
            return Ok(records);
        }
        if slot.completed.load(Ordering::Acquire) != seen {
            // The refresh we waited on failed; share its outcome
            if let Some(err) = last_error.clone() {
                return Err(err);
            }
        }

        let result = self.refresh(category, settings).await;
        *last_error = result.as_ref().err().cloned();
        slot.completed.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(entry) => {
                self.refresh_count.fetch_add(1, Ordering::Relaxed);
                Ok(Arc::clone(&entry.records))
            }
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(%category, error = %err, "Refresh failed");
                Err(err)
            }
        }
    }

    fn live_records(&self, category: Category) -> Option<Arc<[MedicationRecord]>> {
        let entries = self.entries.read();
        let entry = entries.get(&category)?;
        if entry.is_stale(self.clock.now()) {
            return None;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(Arc::clone(&entry.records))
    }

    async fn refresh(&self, category: Category, settings: CategorySettings) -> IngestResult<Arc<CacheEntry>> {
        debug!(%category, sheet = settings.sheet, "Refreshing category");

        let html = self.fetcher.fetch_landing_page().await?;
        let link = self.resolver.resolve(&html, self.clock.today())?;

        let document = self
            .documents
            .get_or_fetch(&link.path, || self.fetcher.fetch_document(&link.path))
            .await?;

        let parser = self.parser;
        let bytes = Arc::clone(&document.bytes);
        let records = tokio::task::spawn_blocking(move || parser.parse(&bytes, settings.sheet))
            .await
            .map_err(|e| IngestError::MalformedDocument(format!("parser task failed: {}", e)))??;

        let entry = Arc::new(CacheEntry {
            category,
            records: records.into(),
            inserted_at: self.clock.now(),
            ttl: chrono::Duration::from_std(settings.ttl()).unwrap_or(chrono::Duration::MAX),
            source: link,
        });

        info!(
            %category,
            records = entry.records.len(),
            path = %entry.source.path,
            publish_date = %entry.source.publish_date,
            expires_at = %entry.expires_at(),
            "Category refreshed"
        );

        self.entries.write().insert(category, Arc::clone(&entry));
        Ok(entry)
    }

    /// Current entry for `category`, stale or not, without refreshing
    pub fn snapshot(&self, category: Category) -> Option<Arc<CacheEntry>> {
        self.entries.read().get(&category).cloned()
    }

    /// Drop the entry for `category` so the next call refreshes it
    pub fn invalidate(&self, category: Category) -> bool {
        self.entries.write().remove(&category).is_some()
    }

    /// Categories this cache can serve
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.keys().copied()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            refreshes: self.refresh_count.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use chrono::TimeZone;
    use rust_xlsxwriter::Workbook;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    const HEADER: [&str; 4] = [
        "Grupa maladiilor pentru compensare",
        "Denumirea comercială (DC)",
        "Suma fixă compensată per unitate de măsură inclusiv TVA",
        "Data înregistrării",
    ];

    fn workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        for (sheet, names) in [
            vec!["Metformin", "Insulina"],
            vec!["Salbutamol"],
            vec!["Paxlovid", "Molnupiravir", "Remdesivir"],
        ]
        .into_iter()
        .enumerate()
        {
            let worksheet = workbook.add_worksheet();
            for (col, label) in HEADER.iter().enumerate() {
                worksheet.write_string(0, col as u16, *label).unwrap();
            }
            for (i, name) in names.iter().enumerate() {
                let row = i as u32 + 1;
                worksheet.write_string(row, 0, format!("Grupa {}", sheet)).unwrap();
                worksheet.write_string(row, 1, *name).unwrap();
                worksheet.write_number(row, 2, 1.5 + i as f64).unwrap();
                worksheet.write_string(row, 3, "01.02.2023").unwrap();
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[derive(Debug)]
    struct FakeSource {
        html: String,
        document: Vec<u8>,
        fail_landing: AtomicBool,
        landing_fetches: AtomicUsize,
        document_fetches: AtomicUsize,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                html: r#"<ul><li><a href="/files/list.xlsx">Lista Denumirilor Comerciale compensate (15.03.2024)</a></li></ul>"#
                    .to_string(),
                document: workbook(),
                fail_landing: AtomicBool::new(false),
                landing_fetches: AtomicUsize::new(0),
                document_fetches: AtomicUsize::new(0),
            }
        }

        fn landing_fetches(&self) -> usize {
            self.landing_fetches.load(Ordering::SeqCst)
        }

        fn document_fetches(&self) -> usize {
            self.document_fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SourceFetcher for FakeSource {
        async fn fetch_landing_page(&self) -> IngestResult<String> {
            self.landing_fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_landing.load(Ordering::SeqCst) {
                return Err(IngestError::fetch("http://www.cnam.md/index.php?page=295", "HTTP status 503"));
            }
            Ok(self.html.clone())
        }

        async fn fetch_document(&self, path: &str) -> IngestResult<Vec<u8>> {
            assert_eq!(path, "/files/list.xlsx");
            self.document_fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(self.document.clone())
        }
    }

    fn setup(config: &Config) -> (Arc<FakeSource>, Arc<ManualClock>, CategoryCache) {
        let source = Arc::new(FakeSource::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap()));
        let cache = CategoryCache::with_clock(source.clone(), config, clock.clone());
        (source, clock, cache)
    }

    #[tokio::test]
    async fn test_immediate_second_call_is_served_from_cache() {
        let (source, _, cache) = setup(&Config::default());

        let first = cache.get_records(Category::FullyCompensated).await.unwrap();
        let second = cache.get_records(Category::FullyCompensated).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].commercial_name.as_deref(), Some("Metformin"));
        assert_eq!(source.document_fetches(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, refreshes: 1, failures: 0 });
    }

    #[tokio::test]
    async fn test_categories_read_their_own_sheet() {
        let (source, _, cache) = setup(&Config::default());

        let partial = cache.get_records(Category::PartiallyCompensated).await.unwrap();
        let pandemic = cache.get_records(Category::Pandemic).await.unwrap();

        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].commercial_name.as_deref(), Some("Salbutamol"));
        assert_eq!(pandemic.len(), 3);
        assert_eq!(pandemic[2].disease_group.as_deref(), Some("Grupa 2"));
        // Both refreshes resolved the landing page but shared one download
        assert_eq!(source.landing_fetches(), 2);
        assert_eq!(source.document_fetches(), 1);
    }

    #[tokio::test]
    async fn test_ttl_boundary_for_fully_compensated() {
        let (source, clock, cache) = setup(&Config::default());

        cache.get_records(Category::FullyCompensated).await.unwrap();
        assert_eq!(source.landing_fetches(), 1);

        clock.advance(chrono::Duration::hours(5) + chrono::Duration::minutes(59));
        cache.get_records(Category::FullyCompensated).await.unwrap();
        assert_eq!(source.landing_fetches(), 1);

        clock.advance(chrono::Duration::minutes(2));
        cache.get_records(Category::FullyCompensated).await.unwrap();
        assert_eq!(source.landing_fetches(), 2);
        assert_eq!(cache.stats().refreshes, 2);
    }

    #[tokio::test]
    async fn test_partial_list_outlives_full_list() {
        let (source, clock, cache) = setup(&Config::default());

        cache.get_records(Category::FullyCompensated).await.unwrap();
        cache.get_records(Category::PartiallyCompensated).await.unwrap();
        clock.advance(chrono::Duration::hours(7));

        cache.get_records(Category::PartiallyCompensated).await.unwrap();
        assert_eq!(source.landing_fetches(), 2);
        cache.get_records(Category::FullyCompensated).await.unwrap();
        assert_eq!(source.landing_fetches(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_callers_trigger_one_refresh() {
        let (source, _, cache) = setup(&Config::default());

        let (a, b, c) = tokio::join!(
            cache.get_records(Category::Pandemic),
            cache.get_records(Category::Pandemic),
            cache.get_records(Category::Pandemic),
        );

        let a = a.unwrap();
        assert!(Arc::ptr_eq(&a, &b.unwrap()));
        assert!(Arc::ptr_eq(&a, &c.unwrap()));
        assert_eq!(source.landing_fetches(), 1);
        assert_eq!(source.document_fetches(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_a_failure() {
        let (source, _, cache) = setup(&Config::default());
        source.fail_landing.store(true, Ordering::SeqCst);

        let (a, b) = tokio::join!(
            cache.get_records(Category::FullyCompensated),
            cache.get_records(Category::FullyCompensated),
        );

        assert!(matches!(a, Err(IngestError::FetchFailed { .. })));
        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert_eq!(source.landing_fetches(), 1);
        assert!(cache.snapshot(Category::FullyCompensated).is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_entry() {
        let (source, clock, cache) = setup(&Config::default());

        let records = cache.get_records(Category::FullyCompensated).await.unwrap();
        clock.advance(chrono::Duration::hours(7));
        source.fail_landing.store(true, Ordering::SeqCst);

        let err = cache.get_records(Category::FullyCompensated).await.unwrap_err();
        assert!(matches!(err, IngestError::FetchFailed { .. }));

        let entry = cache.snapshot(Category::FullyCompensated).unwrap();
        assert!(Arc::ptr_eq(&entry.records, &records));
        assert_eq!(cache.stats().failures, 1);

        // A later caller retries rather than replaying the old failure
        source.fail_landing.store(false, Ordering::SeqCst);
        let fresh = cache.get_records(Category::FullyCompensated).await.unwrap();
        assert!(!Arc::ptr_eq(&fresh, &records));
    }

    #[tokio::test]
    async fn test_unconfigured_category_is_unknown() {
        let mut config = Config::default();
        config.categories.remove("pandemic");
        let (source, _, cache) = setup(&config);

        let err = cache.get_records(Category::Pandemic).await.unwrap_err();
        assert_eq!(err, IngestError::UnknownCategory("pandemic".to_string()));
        assert_eq!(source.landing_fetches(), 0);
        assert_eq!(cache.categories().count(), 2);
    }

    #[tokio::test]
    async fn test_missing_sheet_is_malformed() {
        let mut config = Config::default();
        config.categories.insert(
            "pandemic".to_string(),
            CategorySettings { sheet: 9, ttl_secs: 60 },
        );
        let (_, _, cache) = setup(&config);

        let err = cache.get_records(Category::Pandemic).await.unwrap_err();
        assert!(matches!(err, IngestError::MalformedDocument(ref msg) if msg.contains("sheet 9")));
    }

    #[tokio::test]
    async fn test_snapshot_and_invalidate() {
        let (source, _, cache) = setup(&Config::default());
        assert!(cache.snapshot(Category::FullyCompensated).is_none());

        cache.get_records(Category::FullyCompensated).await.unwrap();
        let entry = cache.snapshot(Category::FullyCompensated).unwrap();
        assert_eq!(entry.source.path, "/files/list.xlsx");
        assert_eq!(entry.source.publish_date, chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(entry.expires_at(), entry.inserted_at + chrono::Duration::hours(6));

        assert!(cache.invalidate(Category::FullyCompensated));
        assert!(!cache.invalidate(Category::FullyCompensated));
        cache.get_records(Category::FullyCompensated).await.unwrap();
        assert_eq!(source.landing_fetches(), 2);
        // The workbook itself is still within its retention window
        assert_eq!(source.document_fetches(), 1);
    }

    #[tokio::test]
    async fn test_future_dated_link_fails_refresh() {
        let (_, clock, cache) = setup(&Config::default());
        clock.set(Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap());

        let err = cache.get_records(Category::FullyCompensated).await.unwrap_err();
        assert!(matches!(err, IngestError::LinkNotFound(ref msg) if msg.contains("future-dated")));
    }
}
