//! Ingest use-case service.
//!
//! # Responsibility
//! - Run incremental article/highlight sync for one subject.
//! - Resolve single articles by address for deep links.
//! - Serve keyword search over stored articles.
//!
//! # Invariants
//! - Displayed articles always come from the store, not from the fetched delta.
//! - A failed record save is logged and skipped; it never aborts a sync.
//! - The subject watermark advances past every fetched article, persisted
//!   or not.
//! - `sync_articles` takes `&mut self`; one service syncs one subject at a time.

use crate::model::address::{Address, AddressError};
use crate::model::article::{Article, ArticleViewError, Highlight};
use crate::model::entity::EntityRef;
use crate::model::filter::RecordFilter;
use crate::model::record::{
    is_lower_hex, Record, KIND_ARTICLE, KIND_HIGHLIGHT, TAG_ADDRESS, TAG_IDENTIFIER,
};
use crate::relay::aggregator::Aggregator;
use crate::repo::record_repo::{RecordStore, RepoError, SaveOutcome};
use crate::search::fts::SearchQuery;
use crate::service::assembler::{assemble, canonical_articles, sort_newest_first};
use crate::sync::watermark::SyncTracker;
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};
use uuid::Uuid;

const DEFAULT_ARTICLE_FETCH_LIMIT: u32 = 1000;
const DEFAULT_STORE_ARTICLE_LIMIT: u32 = 500;

/// Service error for ingest, resolution and search use-cases.
#[derive(Debug)]
pub enum IngestError {
    /// Address names no stored article.
    NotFound(Address),
    MalformedReference(AddressError),
    /// Subject is not a lowercase hex public key.
    InvalidSubject(String),
    /// Entity variant cannot be resolved to an article.
    UnsupportedEntity(&'static str),
    /// Stored record could not be projected into an article.
    View(ArticleViewError),
    Repo(RepoError),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(address) => write!(f, "article not found: {address}"),
            Self::MalformedReference(err) => write!(f, "{err}"),
            Self::InvalidSubject(value) => write!(f, "invalid subject: `{value}`"),
            Self::UnsupportedEntity(label) => {
                write!(f, "entity `{label}` does not resolve to an article")
            }
            Self::View(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedReference(err) => Some(err),
            Self::View(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for IngestError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<AddressError> for IngestError {
    fn from(value: AddressError) -> Self {
        Self::MalformedReference(value)
    }
}

impl From<ArticleViewError> for IngestError {
    fn from(value: ArticleViewError) -> Self {
        Self::View(value)
    }
}

/// Tunables for one service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Upper bound for a whole `sync_articles` call, covering both fan-outs.
    pub deadline: Option<Duration>,
    /// Result cap sent to relays for the article query.
    pub article_fetch_limit: u32,
    /// Cap on stored articles read back per subject.
    pub store_article_limit: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            deadline: None,
            article_fetch_limit: DEFAULT_ARTICLE_FETCH_LIMIT,
            store_article_limit: DEFAULT_STORE_ARTICLE_LIMIT,
        }
    }
}

#[derive(Debug, Default)]
struct PersistStats {
    inserted: usize,
    already_present: usize,
    failed: usize,
}

/// Sync/resolve facade over a record store and a relay aggregator.
pub struct IngestService<S: RecordStore> {
    store: S,
    aggregator: Aggregator,
    tracker: SyncTracker,
    options: SyncOptions,
}

impl<S: RecordStore> IngestService<S> {
    pub fn new(store: S, aggregator: Aggregator) -> Self {
        Self::with_options(store, aggregator, SyncOptions::default())
    }

    pub fn with_options(store: S, aggregator: Aggregator, options: SyncOptions) -> Self {
        Self {
            store,
            aggregator,
            tracker: SyncTracker::new(),
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tracker(&self) -> &SyncTracker {
        &self.tracker
    }

    /// Mutable tracker access, e.g. to `reset` a subject for manual re-sync.
    pub fn tracker_mut(&mut self) -> &mut SyncTracker {
        &mut self.tracker
    }

    /// Fetches new articles and their highlights for `subject`, persists
    /// them, and returns the subject's stored articles newest first.
    pub fn sync_articles(&mut self, subject: &str) -> Result<Vec<Article>, IngestError> {
        if !is_lower_hex(subject) {
            return Err(IngestError::InvalidSubject(subject.to_string()));
        }

        let run_id = Uuid::new_v4();
        let started_at = Instant::now();
        let deadline = self.options.deadline.map(|limit| started_at + limit);
        let boundary = self.tracker.boundary_for(subject);
        info!(
            "event=sync_articles module=ingest status=start run_id={} subject={} boundary={}",
            run_id, subject, boundary
        );

        let article_filter = RecordFilter::new()
            .kind(KIND_ARTICLE)
            .author(subject)
            .since(boundary)
            .limit(self.options.article_fetch_limit);
        let batch = self.fetch(&article_filter, deadline);

        let mut addresses = BTreeSet::new();
        let mut articles_to_save = Vec::with_capacity(batch.len());
        for record in &batch {
            match record.address() {
                Some(address) => {
                    addresses.insert(address.canonical());
                    articles_to_save.push(record);
                }
                None => debug!(
                    "event=sync_record_skipped module=ingest run_id={} record_id={} reason=missing_identifier",
                    run_id, record.id
                ),
            }
        }
        let article_stats = self.persist(run_id, articles_to_save);

        if let Some(next) = self
            .tracker
            .advance_past(subject, batch.iter().map(|record| record.created_at))
        {
            info!(
                "event=watermark_advance module=ingest run_id={} subject={} boundary={}",
                run_id, subject, next
            );
        }
        if article_stats.failed > 0 {
            error!(
                "event=watermark_advance module=ingest status=degraded run_id={} subject={} failed_records={} action=manual_resync_required",
                run_id, subject, article_stats.failed
            );
        }

        let mut highlight_stats = PersistStats::default();
        if !addresses.is_empty() {
            let highlight_filter = RecordFilter::new()
                .kind(KIND_HIGHLIGHT)
                .author(subject)
                .tag(TAG_ADDRESS, addresses);
            let highlights = self.fetch(&highlight_filter, deadline);
            highlight_stats = self.persist(run_id, highlights.iter());
        }

        let articles = self.stored_articles(subject)?;
        info!(
            "event=sync_articles module=ingest status=ok run_id={} subject={} fetched={} articles_saved={} highlights_saved={} save_failures={} returned={} duration_ms={}",
            run_id,
            subject,
            batch.len(),
            article_stats.inserted,
            highlight_stats.inserted,
            article_stats.failed + highlight_stats.failed,
            articles.len(),
            started_at.elapsed().as_millis()
        );
        Ok(articles)
    }

    /// Returns the subject's stored articles, canonical versions only,
    /// overlaid with stored highlights, newest first.
    ///
    /// `store_article_limit` caps the number of addresses returned; superseded
    /// versions never count against it.
    pub fn stored_articles(&self, subject: &str) -> Result<Vec<Article>, IngestError> {
        if !is_lower_hex(subject) {
            return Err(IngestError::InvalidSubject(subject.to_string()));
        }
        let filter = RecordFilter::new().kind(KIND_ARTICLE).author(subject);
        let records = self.store.query(&filter)?;

        let mut canonical = canonical_articles(&records);
        canonical.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        canonical.truncate(self.options.store_article_limit as usize);

        let mut articles = Vec::new();
        for record in canonical {
            match self.assemble_stored(record) {
                Ok(article) => articles.push(article),
                Err(IngestError::View(err)) => {
                    warn!(
                        "event=article_skipped module=ingest record_id={} error={}",
                        record.id, err
                    );
                }
                Err(other) => return Err(other),
            }
        }
        sort_newest_first(&mut articles);
        Ok(articles)
    }

    /// Resolves a composite address string into its overlaid article.
    pub fn resolve_article(&self, raw_address: &str) -> Result<Article, IngestError> {
        let address: Address = raw_address.trim().parse()?;
        self.resolve_address(&address)
    }

    pub fn resolve_address(&self, address: &Address) -> Result<Article, IngestError> {
        let record = self
            .canonical_record(address)?
            .ok_or_else(|| IngestError::NotFound(address.clone()))?;
        self.assemble_stored(&record)
    }

    pub fn resolve_entity(&self, entity: &EntityRef) -> Result<Article, IngestError> {
        match entity {
            EntityRef::Address(address) => self.resolve_address(address),
            other => Err(IngestError::UnsupportedEntity(other.label())),
        }
    }

    /// Stored highlights referencing `address`, oldest first.
    pub fn highlights_for(&self, address: &Address) -> Result<Vec<Highlight>, IngestError> {
        let mut highlights: Vec<Highlight> = self
            .highlight_records(address)?
            .iter()
            .filter_map(|record| Highlight::from_record(record).ok())
            .collect();
        highlights.sort_by(|left, right| {
            left.created_at
                .cmp(&right.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(highlights)
    }

    /// Keyword search over stored articles; only canonical versions are
    /// returned, in rank order.
    pub fn search_articles(&self, text: &str) -> Result<Vec<Article>, IngestError> {
        self.search_with(SearchQuery::new(text).kind(KIND_ARTICLE))
    }

    /// Keyword search restricted to one author's articles.
    pub fn search_articles_by(
        &self,
        author: &str,
        text: &str,
    ) -> Result<Vec<Article>, IngestError> {
        if !is_lower_hex(author) {
            return Err(IngestError::InvalidSubject(author.to_string()));
        }
        self.search_with(SearchQuery::new(text).kind(KIND_ARTICLE).author(author))
    }

    fn search_with(&self, query: SearchQuery) -> Result<Vec<Article>, IngestError> {
        let hits = self.store.search(&query)?;

        let mut seen = BTreeSet::new();
        let mut articles = Vec::new();
        for hit in hits {
            let filter = RecordFilter::new().ids([hit.record_id.as_str()]).limit(1);
            let Some(record) = self.store.query(&filter)?.into_iter().next() else {
                continue;
            };
            let Some(address) = record.address() else {
                continue;
            };
            let is_canonical = self
                .canonical_record(&address)?
                .is_some_and(|canonical| canonical.id == record.id);
            if !is_canonical || !seen.insert(address) {
                continue;
            }
            articles.push(self.assemble_stored(&record)?);
        }
        Ok(articles)
    }

    fn canonical_record(&self, address: &Address) -> Result<Option<Record>, IngestError> {
        let filter = RecordFilter::new()
            .kind(address.kind)
            .author(address.author.as_str())
            .tag(TAG_IDENTIFIER, [address.identifier.as_str()])
            .limit(1);
        Ok(self.store.query(&filter)?.into_iter().next())
    }

    fn highlight_records(&self, address: &Address) -> Result<Vec<Record>, IngestError> {
        let filter = RecordFilter::new()
            .kind(KIND_HIGHLIGHT)
            .tag(TAG_ADDRESS, [address.canonical()]);
        Ok(self.store.query(&filter)?)
    }

    fn assemble_stored(&self, record: &Record) -> Result<Article, IngestError> {
        let address = record
            .address()
            .ok_or_else(|| ArticleViewError::MissingIdentifier(record.id.clone()))?;
        let highlights = self.highlight_records(&address)?;
        Ok(assemble(record, &highlights)?)
    }

    fn fetch(&self, filter: &RecordFilter, deadline: Option<Instant>) -> Vec<Record> {
        match deadline {
            Some(deadline) => self.aggregator.fetch_until(filter, deadline),
            None => self.aggregator.fetch(filter),
        }
    }

    fn persist<'r>(
        &self,
        run_id: Uuid,
        records: impl IntoIterator<Item = &'r Record>,
    ) -> PersistStats {
        let mut stats = PersistStats::default();
        for record in records {
            match self.store.save(record) {
                Ok(SaveOutcome::Inserted) => stats.inserted += 1,
                Ok(SaveOutcome::AlreadyPresent) => stats.already_present += 1,
                Err(err) => {
                    stats.failed += 1;
                    error!(
                        "event=persist_record module=ingest status=error run_id={} record_id={} kind={} error={}",
                        run_id, record.id, record.kind, err
                    );
                }
            }
        }
        debug!(
            "event=persist_batch module=ingest run_id={} inserted={} already_present={} failed={}",
            run_id, stats.inserted, stats.already_present, stats.failed
        );
        stats
    }
}
