//! OpenAlex works API client.
//!
//! Fetches candidate works either filtered to a single subscribed source or
//! by a free-text keyword predicate over title/abstract. Both queries are
//! sorted by descending publication date and bounded by the configured page
//! size; a bounded request timeout turns a slow upstream into a per-source
//! failure rather than a hung sync.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::OpenAlexConfig;

/// One page of the `/works` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct WorksPage {
    #[serde(default)]
    pub results: Vec<RawWork>,
}

/// A raw work as returned by OpenAlex, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWork {
    pub doi: Option<String>,
    pub display_name: Option<String>,
    pub publication_date: Option<String>,
    #[serde(default)]
    pub cited_by_count: i64,
    pub abstract_inverted_index: Option<HashMap<String, Vec<u32>>>,
    #[serde(default)]
    pub authorships: Vec<RawAuthorship>,
    pub primary_location: Option<RawLocation>,
    pub best_oa_location: Option<RawLocation>,
    /// Deprecated upstream in favor of `primary_location.source`, but still
    /// present on older records.
    pub host_venue: Option<RawVenue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthorship {
    pub author: Option<RawAuthor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthor {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocation {
    pub pdf_url: Option<String>,
    pub landing_page_url: Option<String>,
    pub source: Option<RawSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVenue {
    pub display_name: Option<String>,
}

/// Upstream fetch seam used by the ingestion engine.
///
/// The production implementation is [`OpenAlexClient`]; tests substitute a
/// fake with scripted results and failures.
#[async_trait]
pub trait WorkFetcher: Send + Sync {
    /// Fetch recent works published in one subscribed source.
    async fn fetch_by_source(&self, source_id: &str) -> Result<Vec<RawWork>>;

    /// Fetch recent works matching a free-text keyword predicate over
    /// title and abstract. Used as the fallback when subscriptions are quiet.
    async fn fetch_by_keyword(&self, keywords: &str) -> Result<Vec<RawWork>>;
}

/// HTTP client for the OpenAlex works API.
pub struct OpenAlexClient {
    client: reqwest::Client,
    base_url: String,
    per_page: u32,
    mailto: Option<String>,
}

impl OpenAlexClient {
    pub fn new(config: &OpenAlexConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            per_page: config.per_page,
            mailto: config.mailto.clone(),
        })
    }

    async fn fetch_works(&self, filter: &str) -> Result<Vec<RawWork>> {
        let url = format!("{}/works", self.base_url);

        let mut params: Vec<(&str, String)> = vec![
            ("filter", filter.to_string()),
            ("sort", "publication_date:desc".to_string()),
            ("per-page", self.per_page.to_string()),
        ];
        // Courtesy identifier for the OpenAlex polite pool.
        if let Some(ref mailto) = self.mailto {
            params.push(("mailto", mailto.clone()));
        }

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("OpenAlex API error {}: {}", status, body);
        }

        let page: WorksPage = response.json().await?;
        Ok(page.results)
    }
}

#[async_trait]
impl WorkFetcher for OpenAlexClient {
    async fn fetch_by_source(&self, source_id: &str) -> Result<Vec<RawWork>> {
        self.fetch_works(&format!("primary_location.source.id:{}", source_id))
            .await
    }

    async fn fetch_by_keyword(&self, keywords: &str) -> Result<Vec<RawWork>> {
        self.fetch_works(&format!("title_and_abstract.search:{}", keywords))
            .await
    }
}
