//! Error types for the scraping tiers, the local stores, and the caller flow.
//!
//! An extraction miss (every selector exhausted without a block passing the
//! length gate) is deliberately absent: tiers report it as `Ok(None)`.

use thiserror::Error;

/// Failures raised by a single fetch tier.
///
/// None of these escape the scrapers: the two-tier strategy logs them and
/// moves to the next tier, or to placeholder data for listings.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// DNS, connect, TLS, body read or 15 second timeout on a static fetch.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{url} answered with HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The headless browser process could not be configured or launched.
    #[error("headless browser unavailable: {0}")]
    BrowserUnavailable(String),

    /// Navigation or script evaluation failed inside a live session.
    #[error("rendering {url} failed: {reason}")]
    Render { url: String, reason: String },

    #[error("rendering {url} did not finish within {secs}s")]
    RenderTimeout { url: String, secs: u64 },
}

/// Failures of the registry and article store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("could not create database directory: {0}")]
    Io(#[from] std::io::Error),

    /// A row or argument that does not fit the data model.
    #[error("malformed record: {0}")]
    Data(String),
}

/// Failures while loading the initial-load file into the registry.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("could not read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("seed file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures that surface from the caller flow for one selected article.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Both tiers exhausted without extracting article content.
    #[error("content unavailable for {url}")]
    ContentUnavailable { url: String },

    #[error("summarizer failed: {0}")]
    Summarizer(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
