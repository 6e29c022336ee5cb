//! # litfeed
//!
//! A scholarly literature feed with incremental ingestion and semantic
//! retrieval.
//!
//! litfeed pulls bibliographic metadata from the OpenAlex works API for a set
//! of subscribed journals, keeps a deduplicated local corpus keyed by DOI,
//! and ranks the corpus against free-text queries by embedding similarity.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────────┐   ┌──────────┐
//! │ OpenAlex │──▶│   Ingestion      │──▶│  SQLite   │
//! │  /works  │   │ decode+normalize│   │  records  │
//! └──────────┘   └─────────────────┘   └────┬─────┘
//!                                           │
//!                       ┌───────────────────┤
//!                       ▼                   ▼
//!                  ┌──────────┐       ┌──────────┐
//!                  │   CLI    │       │   HTTP   │
//!                  │  (lit)   │       │  (feed)  │
//!                  └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lit init                          # create database
//! lit sync                          # ingest new works for all subscriptions
//! lit feed                          # chronological feed
//! lit feed "fall risk" --threshold 0.3   # semantic feed
//! lit serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`decode`] | Inverted-index abstract decoding |
//! | [`normalize`] | Raw work → canonical record |
//! | [`openalex`] | Upstream works API client |
//! | [`store`] | Corpus persistence (SQLite) |
//! | [`embedding`] | Text encoder abstraction |
//! | [`rank`] | Cosine-similarity ranking |
//! | [`ingest`] | Incremental sync pipeline |
//! | [`feed`] | Retrieval surface |
//! | [`server`] | HTTP JSON API |

pub mod config;
pub mod decode;
pub mod embedding;
pub mod feed;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod openalex;
pub mod rank;
pub mod server;
pub mod store;
