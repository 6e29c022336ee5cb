//! # litfeed CLI (`lit`)
//!
//! The `lit` binary is the primary interface for litfeed. It provides
//! commands for database initialization, incremental ingestion from
//! OpenAlex, ranked and chronological feeds, read-state updates, and the
//! HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! lit --config ./config/litfeed.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lit init` | Create the SQLite database and run schema migrations |
//! | `lit sources` | List configured subscriptions |
//! | `lit sync [source..]` | Ingest new works for the selected subscriptions |
//! | `lit feed ["query"]` | Print the feed, ranked when a query is given |
//! | `lit read <doi>` | Mark a record read |
//! | `lit serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! lit init --config ./config/litfeed.toml
//!
//! # Sync every configured subscription
//! lit sync
//!
//! # Sync one subscription by name or raw source id
//! lit sync "The Gerontologist"
//! lit sync S151833132
//!
//! # Chronological feed
//! lit feed
//!
//! # Semantic feed with a custom relevance threshold
//! lit feed "fall risk in the built environment" --threshold 0.3
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use litfeed::config;
use litfeed::embedding;
use litfeed::feed;
use litfeed::ingest;
use litfeed::models::FeedItem;
use litfeed::openalex::OpenAlexClient;
use litfeed::server;
use litfeed::store::{CorpusStore, SqliteStore, StoreError};

/// litfeed — a scholarly literature feed with incremental OpenAlex
/// ingestion and semantic retrieval.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/litfeed.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lit",
    about = "litfeed — a scholarly literature feed with incremental OpenAlex ingestion and semantic retrieval",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/litfeed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the records table. Idempotent —
    /// running it multiple times is safe.
    Init,

    /// List configured subscriptions.
    Sources,

    /// Ingest new works for the selected subscriptions.
    ///
    /// Each selector is a subscription name from `[sources]` or a raw
    /// OpenAlex source id. With no selectors, every configured subscription
    /// is synced. Only previously-unseen DOIs are inserted.
    Sync {
        /// Subscription names or source ids.
        sources: Vec<String>,
    },

    /// Print the feed.
    ///
    /// Without a query, records print in reverse chronological order. With
    /// a query, records are ranked by semantic similarity and filtered to
    /// the relevance threshold (requires an embedding provider).
    Feed {
        /// Free-text semantic query.
        query: Option<String>,

        /// Minimum relevance score in [0.0, 1.0]. Defaults to
        /// `retrieval.default_threshold` from config.
        #[arg(long)]
        threshold: Option<f32>,

        /// Restrict to a subscription name or source id. Repeatable.
        #[arg(long = "source")]
        sources: Vec<String>,

        /// Maximum number of records to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Mark a record read.
    Read {
        /// The record's DOI.
        doi: String,
    },

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// feed API for presentation layers.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = SqliteStore::open(&cfg.db.path).await?;
            store.run_migrations().await?;
            store.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Sources => {
            if cfg.sources.is_empty() {
                println!("No subscriptions configured. Add a [sources] table to the config.");
            } else {
                println!("{:<32} SOURCE ID", "SUBSCRIPTION");
                for (name, id) in &cfg.sources {
                    println!("{:<32} {}", name, id);
                }
            }
        }
        Commands::Sync { sources } => {
            let source_ids = cfg.resolve_sources(&sources);
            if source_ids.is_empty() {
                anyhow::bail!("no sources selected and no [sources] configured");
            }

            let store = SqliteStore::open(&cfg.db.path).await?;
            store.run_migrations().await?;
            let fetcher = OpenAlexClient::new(&cfg.openalex)?;

            let report = ingest::run_sync(&cfg, &fetcher, &store, &source_ids).await?;

            println!("sync");
            println!("  sources: {}", source_ids.len());
            println!("  fetched: {} works", report.fetched);
            println!("  inserted: {}", report.inserted);
            println!("  skipped (already ingested): {}", report.skipped_existing);
            if !report.issues.is_empty() {
                println!("  issues: {}", report.issues.len());
                for message in report.issue_messages() {
                    eprintln!("  warning: {}", message);
                }
            }
            println!("ok");

            store.close().await;
        }
        Commands::Feed {
            query,
            threshold,
            sources,
            limit,
        } => {
            let store = SqliteStore::open(&cfg.db.path).await?;
            store.run_migrations().await?;
            let encoder = embedding::create_encoder(&cfg.embedding)?;
            let selected = if sources.is_empty() {
                Vec::new()
            } else {
                cfg.resolve_sources(&sources)
            };

            let mut items = feed::get_feed(
                &cfg,
                &store,
                encoder.as_ref(),
                &selected,
                query.as_deref(),
                threshold,
            )
            .await?;

            if let Some(limit) = limit {
                items.truncate(limit);
            }

            if items.is_empty() {
                println!("No records.");
            } else {
                print_feed(&items);
            }

            store.close().await;
        }
        Commands::Read { doi } => {
            let store = SqliteStore::open(&cfg.db.path).await?;
            store.run_migrations().await?;
            match store.mark_read(&doi).await {
                Ok(()) => println!("marked read: {}", doi),
                Err(StoreError::NotFound(doi)) => {
                    anyhow::bail!("record not found: {}", doi);
                }
                Err(e) => return Err(e.into()),
            }
            store.close().await;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

fn print_feed(items: &[FeedItem]) {
    for (i, item) in items.iter().enumerate() {
        let record = &item.record;

        match item.score {
            Some(score) => println!("{}. [{:.2}] {}", i + 1, score, record.title),
            None => println!("{}. {}", i + 1, record.title),
        }
        if let Some(ref venue) = record.venue {
            println!("    venue: {}", venue);
        }
        if !record.authors.is_empty() {
            println!("    authors: {}", record.author_preview());
        }
        if let Some(date) = record.publication_date {
            println!("    published: {}  citations: {}", date, record.citation_count);
        } else {
            println!("    citations: {}", record.citation_count);
        }
        if let Some(ref url) = record.open_access_url {
            println!("    url: {}", url);
        }
        if record.is_read {
            println!("    read: yes");
        }
        println!("    doi: {}", record.doi);
        println!();
    }
}
