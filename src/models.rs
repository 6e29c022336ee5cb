//! Core data models used throughout litfeed.
//!
//! These types represent the records that flow through the ingestion and
//! retrieval pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of author names shown in the display preview.
pub const AUTHOR_PREVIEW: usize = 3;

/// A deduplicated bibliographic record stored in SQLite.
///
/// Keyed by DOI; content fields are written once at ingestion and never
/// updated by later syncs. Only `is_read` mutates, and only false → true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Stable upstream identifier, e.g. `https://doi.org/10.1093/geront/gnaa100`.
    pub doi: String,
    pub title: String,
    /// Host venue display name, when the upstream work carries one.
    pub venue: Option<String>,
    /// Full ordered author list. Use [`Record::author_preview`] for display.
    pub authors: Vec<String>,
    pub publication_date: Option<NaiveDate>,
    pub citation_count: i64,
    /// Best available full-text link per the open-access resolution policy.
    pub open_access_url: Option<String>,
    /// Decoded abstract text; empty when the work has none.
    pub abstract_text: String,
    /// OpenAlex source id the record arrived from (e.g. `S151833132`).
    pub source_id: Option<String>,
    pub is_read: bool,
    /// Unix timestamp set once at insert.
    pub ingested_at: i64,
}

impl Record {
    /// Bounded author preview for display: the first [`AUTHOR_PREVIEW`]
    /// names, with an `et al.` marker when the list was truncated.
    pub fn author_preview(&self) -> String {
        let shown: Vec<&str> = self
            .authors
            .iter()
            .take(AUTHOR_PREVIEW)
            .map(String::as_str)
            .collect();
        let mut preview = shown.join(", ");
        if self.authors.len() > AUTHOR_PREVIEW {
            preview.push_str(", et al.");
        }
        preview
    }
}

/// A record paired with its relevance score, as returned by the feed.
///
/// `score` is `None` for chronological (unranked) feeds.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}
