//! Retrieval surface consumed by presentation layers.
//!
//! A feed request reads the whole corpus from the store, optionally narrows
//! it to selected sources, and either returns it chronologically (empty
//! query) or ranks it semantically (non-empty query). The only mutation
//! exposed here is marking a record read.

use thiserror::Error;

use crate::config::Config;
use crate::embedding::TextEncoder;
use crate::models::{FeedItem, Record};
use crate::rank;
use crate::store::{CorpusStore, StoreError};

/// Why a feed request failed. The HTTP layer maps the first two variants
/// to 400; the rest are server-side failures.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("threshold must be in [0.0, 1.0], got {0}")]
    InvalidThreshold(f32),
    #[error("embedding provider is disabled; ranked queries need [embedding] configured")]
    EncoderDisabled,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("ranking failed: {0}")]
    Ranking(anyhow::Error),
}

/// Build the feed.
///
/// With an empty (or absent) query this is a passthrough: records come back
/// in the store's reverse-chronological order with no scores. With a query,
/// records are ranked by cosine similarity and filtered to
/// `score >= threshold` (defaulting to `retrieval.default_threshold`).
pub async fn get_feed(
    config: &Config,
    store: &dyn CorpusStore,
    encoder: &dyn TextEncoder,
    selected_sources: &[String],
    query: Option<&str>,
    threshold: Option<f32>,
) -> Result<Vec<FeedItem>, FeedError> {
    let threshold = threshold.unwrap_or(config.retrieval.default_threshold);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(FeedError::InvalidThreshold(threshold));
    }

    let mut records = store.scan_all().await?;

    if !selected_sources.is_empty() {
        records.retain(|r| {
            r.source_id
                .as_deref()
                .map(|id| selected_sources.iter().any(|s| s == id))
                .unwrap_or(false)
        });
    }

    let query = query.map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Ok(records.into_iter().map(chronological_item).collect());
    }
    if !encoder.is_enabled() {
        return Err(FeedError::EncoderDisabled);
    }

    rank::rank(
        encoder,
        config.embedding.batch_size,
        query,
        records,
        threshold,
    )
    .await
    .map_err(FeedError::Ranking)
}

/// Mark a record read. Idempotent; fails when the DOI is unknown.
pub async fn mark_read(store: &dyn CorpusStore, doi: &str) -> crate::store::StoreResult<()> {
    store.mark_read(doi).await
}

fn chronological_item(record: Record) -> FeedItem {
    FeedItem {
        record,
        score: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::embedding::DisabledEncoder;
    use crate::store::{StoreError, StoreResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MemoryStore {
        records: Mutex<Vec<Record>>,
    }

    #[async_trait]
    impl CorpusStore for MemoryStore {
        async fn exists(&self, doi: &str) -> StoreResult<bool> {
            Ok(self.records.lock().unwrap().iter().any(|r| r.doi == doi))
        }

        async fn insert(&self, record: &Record) -> StoreResult<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn mark_read(&self, doi: &str) -> StoreResult<()> {
            let mut records = self.records.lock().unwrap();
            match records.iter_mut().find(|r| r.doi == doi) {
                Some(record) => {
                    record.is_read = true;
                    Ok(())
                }
                None => Err(StoreError::NotFound(doi.to_string())),
            }
        }

        async fn scan_all(&self) -> StoreResult<Vec<Record>> {
            Ok(self.records.lock().unwrap().clone())
        }
    }

    fn record(doi: &str, source_id: Option<&str>) -> Record {
        Record {
            doi: doi.to_string(),
            title: "t".to_string(),
            venue: None,
            authors: Vec::new(),
            publication_date: None,
            citation_count: 0,
            open_access_url: None,
            abstract_text: String::new(),
            source_id: source_id.map(String::from),
            is_read: false,
            ingested_at: 0,
        }
    }

    fn store_with(records: Vec<Record>) -> MemoryStore {
        MemoryStore {
            records: Mutex::new(records),
        }
    }

    fn test_config() -> Config {
        Config {
            db: DbConfig {
                path: "unused.sqlite".into(),
            },
            openalex: Default::default(),
            sources: Default::default(),
            ingest: Default::default(),
            embedding: Default::default(),
            retrieval: Default::default(),
            server: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_empty_query_is_chronological_passthrough() {
        let store = store_with(vec![record("10.1/a", None), record("10.1/b", None)]);
        let config = test_config();

        // DisabledEncoder errors on any encode call, so a passing result
        // proves the encoder is never consulted for empty queries.
        let feed = get_feed(&config, &store, &DisabledEncoder, &[], None, None)
            .await
            .unwrap();
        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|item| item.score.is_none()));

        let feed = get_feed(&config, &store, &DisabledEncoder, &[], Some("   "), None)
            .await
            .unwrap();
        assert_eq!(feed.len(), 2);
    }

    #[tokio::test]
    async fn test_source_filter() {
        let store = store_with(vec![
            record("10.1/a", Some("S1")),
            record("10.1/b", Some("S2")),
            record("10.1/c", None),
        ]);
        let config = test_config();

        let feed = get_feed(
            &config,
            &store,
            &DisabledEncoder,
            &["S1".to_string()],
            None,
            None,
        )
        .await
        .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].record.doi, "10.1/a");
    }

    #[tokio::test]
    async fn test_invalid_threshold_rejected() {
        let store = store_with(Vec::new());
        let config = test_config();

        let err = get_feed(&config, &store, &DisabledEncoder, &[], None, Some(1.5))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::InvalidThreshold(_)));
        assert!(err.to_string().contains("threshold"));
    }

    #[tokio::test]
    async fn test_query_with_disabled_encoder_errors() {
        let store = store_with(vec![record("10.1/a", None)]);
        let config = test_config();

        let err = get_feed(&config, &store, &DisabledEncoder, &[], Some("falls"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::EncoderDisabled));
    }

    #[tokio::test]
    async fn test_mark_read_passthrough() {
        let store = store_with(vec![record("10.1/a", None)]);
        mark_read(&store, "10.1/a").await.unwrap();
        assert!(store.scan_all().await.unwrap()[0].is_read);

        let err = mark_read(&store, "10.1/ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
