//! Incremental sync pipeline.
//!
//! Coordinates the full ingestion flow: fetch candidates for each subscribed
//! source, normalize, and insert only previously-unseen DOIs. A fetch
//! failure is scoped to its source; the remaining sources still run. When
//! subscriptions yield too few candidates, a broader keyword fetch keeps the
//! corpus from staying empty.

use anyhow::Result;

use crate::config::Config;
use crate::normalize::normalize;
use crate::openalex::WorkFetcher;
use crate::store::{CorpusStore, StoreError};

/// A non-fatal problem encountered during one sync pass.
#[derive(Debug)]
pub enum SyncIssue {
    Fetch { source: String, message: String },

    /// A candidate with no usable DOI; dropped because it cannot be
    /// deduplicated or referenced.
    MalformedRecord,

    /// Insert collided with an existing DOI after `exists` said absent.
    /// Signals a concurrent writer; surfaced, never swallowed.
    Duplicate(String),
}

impl std::fmt::Display for SyncIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncIssue::Fetch { source, message } => {
                write!(f, "fetch failed for {source}: {message}")
            }
            SyncIssue::MalformedRecord => {
                write!(f, "malformed record skipped: no usable DOI")
            }
            SyncIssue::Duplicate(key) => write!(f, "duplicate key on insert: {key}"),
        }
    }
}

impl std::error::Error for SyncIssue {}

/// Outcome of one sync pass. Successful insertions commit even when
/// `issues` is non-empty.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub fetched: usize,
    pub inserted: u64,
    pub skipped_existing: u64,
    pub issues: Vec<SyncIssue>,
}

impl SyncReport {
    pub fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.to_string()).collect()
    }
}

/// Run one incremental sync over the given OpenAlex source ids.
///
/// Idempotent: re-running against unchanged upstream state inserts nothing,
/// because every candidate DOI already passes the `exists` check.
pub async fn run_sync(
    config: &Config,
    fetcher: &dyn WorkFetcher,
    store: &dyn CorpusStore,
    source_ids: &[String],
) -> Result<SyncReport> {
    let mut report = SyncReport::default();
    let mut candidates = Vec::new();

    for source_id in source_ids {
        match fetcher.fetch_by_source(source_id).await {
            Ok(works) => candidates.extend(works),
            Err(e) => report.issues.push(SyncIssue::Fetch {
                source: source_id.clone(),
                message: e.to_string(),
            }),
        }
    }

    // Fallback-on-empty: quiet subscriptions must not leave the corpus bare.
    if candidates.len() < config.ingest.min_results {
        if let Some(ref keywords) = config.ingest.fallback_query {
            match fetcher.fetch_by_keyword(keywords).await {
                Ok(works) => candidates.extend(works),
                Err(e) => report.issues.push(SyncIssue::Fetch {
                    source: format!("keyword:{}", keywords),
                    message: e.to_string(),
                }),
            }
        }
    }

    report.fetched = candidates.len();
    let now = chrono::Utc::now().timestamp();

    for raw in &candidates {
        let Some(mut record) = normalize(raw) else {
            report.issues.push(SyncIssue::MalformedRecord);
            continue;
        };

        // Already ingested, by an earlier sync or earlier in this batch.
        if store.exists(&record.doi).await? {
            report.skipped_existing += 1;
            continue;
        }

        record.ingested_at = now;
        match store.insert(&record).await {
            Ok(()) => report.inserted += 1,
            Err(StoreError::DuplicateKey(doi)) => {
                report.issues.push(SyncIssue::Duplicate(doi));
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(report)
}
