use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub openalex: OpenAlexConfig,
    /// Subscribed sources: display name → OpenAlex source id (e.g. `S151833132`).
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAlexConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Courtesy contact for the OpenAlex polite pool.
    #[serde(default)]
    pub mailto: Option<String>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mailto: None,
            per_page: default_per_page(),
            timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openalex.org".to_string()
}
fn default_per_page() -> u32 {
    50
}
fn default_fetch_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// When source-filtered fetches yield fewer candidates than this, a
    /// broader keyword fetch supplements the result set.
    #[serde(default = "default_min_results")]
    pub min_results: usize,
    /// Keyword predicate for the fallback fetch. Fallback is skipped when unset.
    #[serde(default)]
    pub fallback_query: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            min_results: default_min_results(),
            fallback_query: None,
        }
    }
}

fn default_min_results() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a record to appear in a ranked feed.
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
        }
    }
}

fn default_threshold() -> f32 {
    0.3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7410".to_string()
}

impl Config {
    /// Resolve a CLI source selection to OpenAlex source ids.
    ///
    /// Each selector may be a subscription name from `[sources]` or a raw
    /// source id. An empty selection means every configured subscription.
    pub fn resolve_sources(&self, selected: &[String]) -> Vec<String> {
        if selected.is_empty() {
            return self.sources.values().cloned().collect();
        }
        selected
            .iter()
            .map(|s| self.sources.get(s).cloned().unwrap_or_else(|| s.clone()))
            .collect()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.openalex.per_page == 0 || config.openalex.per_page > 200 {
        anyhow::bail!("openalex.per_page must be in 1..=200");
    }

    if !(0.0..=1.0).contains(&config.retrieval.default_threshold) {
        anyhow::bail!("retrieval.default_threshold must be in [0.0, 1.0]");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("litfeed.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_minimal_config_defaults() {
        let (_tmp, path) = write_config("[db]\npath = \"feed.sqlite\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.openalex.base_url, "https://api.openalex.org");
        assert_eq!(config.openalex.per_page, 50);
        assert_eq!(config.ingest.min_results, 5);
        assert_eq!(config.embedding.provider, "disabled");
        assert!((config.retrieval.default_threshold - 0.3).abs() < f32::EPSILON);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let (_tmp, path) = write_config(
            "[db]\npath = \"feed.sqlite\"\n\n[retrieval]\ndefault_threshold = 1.5\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_enabled_embedding_requires_model_and_dims() {
        let (_tmp, path) =
            write_config("[db]\npath = \"feed.sqlite\"\n\n[embedding]\nprovider = \"openai\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let (_tmp, path) = write_config(
            "[db]\npath = \"feed.sqlite\"\n\n[embedding]\nprovider = \"quantum\"\nmodel = \"m\"\ndims = 4\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_resolve_sources() {
        let (_tmp, path) = write_config(
            "[db]\npath = \"feed.sqlite\"\n\n[sources]\n\"The Gerontologist\" = \"S151833132\"\n\"Health & Place\" = \"S108842106\"\n",
        );
        let config = load_config(&path).unwrap();

        // Empty selection = all subscriptions.
        let all = config.resolve_sources(&[]);
        assert_eq!(all.len(), 2);
        assert!(all.contains(&"S151833132".to_string()));

        // Names resolve, raw ids pass through.
        let picked = config.resolve_sources(&[
            "The Gerontologist".to_string(),
            "S999".to_string(),
        ]);
        assert_eq!(picked, vec!["S151833132", "S999"]);
    }
}
