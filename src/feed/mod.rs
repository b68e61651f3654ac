//! Feed retrieval and normalization.
//!
//! This module provides the core of the service:
//!
//! - **Fetching**: one HTTP GET per URL with a bounded timeout and redirect
//!   count, fanned out concurrently across a batch
//! - **Parsing**: Atom, RSS 2.0 and RSS 1.0 (RDF) via `feed-rs`, normalized
//!   into [`FeedRecord`]s
//! - **Classification**: format-specific acceptance checks used for
//!   verifying individual wire formats
//!
//! # Architecture
//!
//! - [`types`] - records returned to callers and the batch envelopes
//! - [`parser`] - document parsing and the feed/article normalizer
//! - [`classify`] - Atom / RSS 2.0 / RDF classifiers
//! - [`fetcher`] - the single-URL fetcher and the batch aggregator
//!
//! # Example
//!
//! ```no_run
//! use feedfan::config::FetchSettings;
//! use feedfan::feed::FeedFetcher;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), reqwest::Error> {
//! let fetcher = FeedFetcher::new(FetchSettings::default())?;
//! let urls = vec!["https://example.com/feed.xml".to_string()];
//! let result = fetcher.fetch_all(&urls, &CancellationToken::new()).await;
//! assert_eq!(result.len(), urls.len());
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod fetcher;
pub mod parser;
pub mod types;

pub use classify::{
    classify_any, AtomClassifier, Classification, FormatClassifier, RdfClassifier, Rss2Classifier,
};
pub use fetcher::{FeedFetcher, FetchError};
pub use parser::{normalize, parse_feed};
pub use types::{ArticleRecord, BatchRequest, BatchResult, ErrorKind, FeedFailure, FeedRecord};
