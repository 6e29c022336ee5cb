//! Semantic ranking.
//!
//! Embeds a query and the corpus into a shared vector space, scores each
//! record by cosine similarity over `title + abstract`, drops records below
//! the relevance threshold, and sorts the survivors descending by score.
//! Read-only: the corpus is never mutated here.

use anyhow::{bail, Result};
use std::cmp::Ordering;

use crate::embedding::{cosine_similarity, TextEncoder};
use crate::models::{FeedItem, Record};

/// Rank `records` against `query`, keeping scores `>= threshold`.
///
/// Similarities are clamped to `[0, 1]` (zero-norm embeddings score `0`),
/// so a threshold of `0.0` retains the entire corpus. The sort is stable:
/// ties keep the corpus's pre-existing order.
///
/// Record embeddings are computed in batches of `batch_size`; embedding one
/// record is independent of another, only the request count changes.
pub async fn rank(
    encoder: &dyn TextEncoder,
    batch_size: usize,
    query: &str,
    records: Vec<Record>,
    threshold: f32,
) -> Result<Vec<FeedItem>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let query_vec = encoder.encode(query).await?;

    let texts: Vec<String> = records.iter().map(embedding_text).collect();
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        vectors.extend(encoder.encode_batch(batch).await?);
    }
    if vectors.len() != records.len() {
        bail!(
            "encoder returned {} vectors for {} records",
            vectors.len(),
            records.len()
        );
    }

    let mut ranked: Vec<FeedItem> = records
        .into_iter()
        .zip(vectors)
        .map(|(record, vec)| {
            let score = cosine_similarity(&query_vec, &vec).max(0.0);
            FeedItem {
                record,
                score: Some(score),
            }
        })
        .filter(|item| item.score.unwrap_or(0.0) >= threshold)
        .collect();

    // Stable sort: equal scores keep corpus order.
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
    });

    Ok(ranked)
}

/// The text a record is embedded from: title and decoded abstract.
fn embedding_text(record: &Record) -> String {
    format!("{} {}", record.title, record.abstract_text)
}
