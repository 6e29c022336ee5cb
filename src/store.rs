//! Corpus persistence.
//!
//! The [`CorpusStore`] trait is the contract the pipeline consumes: an
//! append-only table keyed by DOI with an existence check, a strictly
//! additive insert, an idempotent read-state update, and a full scan in
//! reverse chronological order. [`SqliteStore`] is the shipped
//! implementation; its primary-key constraint turns a concurrent
//! exists/insert race into a detectable [`StoreError::DuplicateKey`]
//! instead of a silent duplicate.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::models::Record;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert hit an already-present DOI. Signals a race when the caller
    /// checked `exists` first.
    #[error("record already exists: {0}")]
    DuplicateKey(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("stored record is malformed: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable corpus table keyed by DOI.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    async fn exists(&self, doi: &str) -> StoreResult<bool>;

    /// Strictly additive: fails with [`StoreError::DuplicateKey`] when the
    /// DOI is already present. No upsert semantics.
    async fn insert(&self, record: &Record) -> StoreResult<()>;

    /// Idempotent false → true transition; [`StoreError::NotFound`] when
    /// the DOI is absent.
    async fn mark_read(&self, doi: &str) -> StoreResult<()>;

    /// Full corpus scan, publication date descending.
    async fn scan_all(&self) -> StoreResult<Vec<Record>>;
}

/// SQLite-backed corpus store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path` in WAL mode.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the schema. Idempotent.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                doi TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                venue TEXT,
                authors TEXT NOT NULL DEFAULT '[]',
                publication_date TEXT,
                citation_count INTEGER NOT NULL DEFAULT 0,
                open_access_url TEXT,
                abstract_text TEXT NOT NULL DEFAULT '',
                source_id TEXT,
                is_read INTEGER NOT NULL DEFAULT 0,
                ingested_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_publication_date ON records(publication_date DESC)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_source_id ON records(source_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Record> {
        let authors_json: String = row.get("authors");
        let authors: Vec<String> = serde_json::from_str(&authors_json)
            .map_err(|e| StoreError::Corrupt(format!("authors column: {}", e)))?;

        let publication_date: Option<String> = row.get("publication_date");

        Ok(Record {
            doi: row.get("doi"),
            title: row.get("title"),
            venue: row.get("venue"),
            authors,
            publication_date: publication_date
                .as_deref()
                .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
            citation_count: row.get("citation_count"),
            open_access_url: row.get("open_access_url"),
            abstract_text: row.get("abstract_text"),
            source_id: row.get("source_id"),
            is_read: row.get::<i64, _>("is_read") != 0,
            ingested_at: row.get("ingested_at"),
        })
    }
}

#[async_trait]
impl CorpusStore for SqliteStore {
    async fn exists(&self, doi: &str) -> StoreResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM records WHERE doi = ?")
            .bind(doi)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, record: &Record) -> StoreResult<()> {
        let authors_json = serde_json::to_string(&record.authors)
            .map_err(|e| StoreError::Corrupt(format!("authors column: {}", e)))?;
        let publication_date = record
            .publication_date
            .map(|d| d.format("%Y-%m-%d").to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO records (doi, title, venue, authors, publication_date,
                                 citation_count, open_access_url, abstract_text,
                                 source_id, is_read, ingested_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.doi)
        .bind(&record.title)
        .bind(&record.venue)
        .bind(&authors_json)
        .bind(&publication_date)
        .bind(record.citation_count)
        .bind(&record.open_access_url)
        .bind(&record.abstract_text)
        .bind(&record.source_id)
        .bind(record.is_read as i64)
        .bind(record.ingested_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateKey(record.doi.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_read(&self, doi: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE records SET is_read = 1 WHERE doi = ?")
            .bind(doi)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(doi.to_string()));
        }
        Ok(())
    }

    async fn scan_all(&self) -> StoreResult<Vec<Record>> {
        let rows = sqlx::query(
            r#"
            SELECT doi, title, venue, authors, publication_date, citation_count,
                   open_access_url, abstract_text, source_id, is_read, ingested_at
            FROM records
            ORDER BY publication_date DESC, doi ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }
}
