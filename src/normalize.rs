//! Raw work normalization.
//!
//! Maps a raw OpenAlex work into the canonical [`Record`] shape: decoded
//! abstract, resolved open-access link, lenient publication date. Pure and
//! deterministic; a work with no usable DOI cannot be deduplicated and is
//! rejected.

use chrono::NaiveDate;

use crate::decode::decode_abstract;
use crate::models::Record;
use crate::openalex::{RawLocation, RawWork};

/// Normalize a raw work, or `None` when it has no usable DOI.
///
/// `ingested_at` is left at zero; the ingestion engine stamps it just
/// before insert so normalization stays deterministic.
pub fn normalize(raw: &RawWork) -> Option<Record> {
    let doi = raw.doi.as_deref()?.trim();
    if doi.is_empty() {
        return None;
    }

    let authors: Vec<String> = raw
        .authorships
        .iter()
        .filter_map(|a| a.author.as_ref()?.display_name.clone())
        .collect();

    let venue = raw
        .primary_location
        .as_ref()
        .and_then(|l| l.source.as_ref())
        .and_then(|s| s.display_name.clone())
        .or_else(|| raw.host_venue.as_ref().and_then(|v| v.display_name.clone()));

    let source_id = raw
        .primary_location
        .as_ref()
        .and_then(|l| l.source.as_ref())
        .and_then(|s| s.id.clone())
        .map(|id| short_source_id(&id));

    Some(Record {
        doi: doi.to_string(),
        title: raw.display_name.clone().unwrap_or_default(),
        venue,
        authors,
        publication_date: raw
            .publication_date
            .as_deref()
            .and_then(parse_publication_date),
        citation_count: raw.cited_by_count.max(0),
        open_access_url: Some(resolve_open_access(doi, raw.best_oa_location.as_ref())),
        abstract_text: decode_abstract(raw.abstract_inverted_index.as_ref()),
        source_id,
        is_read: false,
        ingested_at: 0,
    })
}

/// Pick the best available full-text link: a direct open-access PDF when
/// one exists, otherwise the canonical `https://doi.org/...` link. Every
/// record carries a DOI, so there is always a link.
fn resolve_open_access(doi: &str, best_oa: Option<&RawLocation>) -> String {
    if let Some(url) = best_oa.and_then(|l| l.pdf_url.clone()) {
        return url;
    }
    if doi.starts_with("http") {
        doi.to_string()
    } else {
        format!("https://doi.org/{}", doi)
    }
}

/// Parse a possibly partial publication date: `YYYY-MM-DD`, `YYYY-MM`, or
/// `YYYY`. Partial dates snap to the first day of the period.
fn parse_publication_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDate::parse_from_str(&format!("{}-01-01", s), "%Y-%m-%d").ok()
}

/// OpenAlex entity ids come as full URLs (`https://openalex.org/S123`);
/// keep just the trailing `S123` so config source ids compare equal.
fn short_source_id(id: &str) -> String {
    id.rsplit('/').next().unwrap_or(id).to_string()
}
