//! Concurrent RSS/Atom batch fetcher.
//!
//! Give it a list of feed URLs and it fetches them all at once, parses each
//! document, and hands back the feeds that worked alongside one error entry
//! per URL that did not. A single slow or broken URL never blocks or spoils
//! the rest of the batch.
//!
//! - [`feed`] - fetcher, batch aggregator, parser and format classifiers
//! - [`api`] - JSON HTTP front end (`POST /api/parse`)
//! - [`config`] - TOML configuration and environment overrides
//! - [`util`] - URL validation and error rendering

pub mod api;
pub mod config;
pub mod feed;
pub mod util;
