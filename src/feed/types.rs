//! Records produced by a batch fetch and the request/response envelopes
//! exchanged with the HTTP front end.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A successfully fetched and normalized feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedRecord {
    pub title: String,
    /// The site's human-facing home page (may be empty).
    ///
    /// Taken from the parsed link, so it is the normalized URL form
    /// (`https://home.example` becomes `https://home.example/`).
    #[serde(rename = "link")]
    pub home_link: String,
    /// The feed's own address: its declared self link, else the requested URL.
    #[serde(rename = "feedUrl")]
    pub feed_url: String,
    /// Items in document order.
    pub articles: Vec<ArticleRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    pub link: String,
    /// The item's published date, else its updated date, as RFC 3339 in UTC.
    ///
    /// The source offset is not kept (`+0900` is shifted to `+00:00`) and a
    /// date the parser cannot read is dropped, leaving this empty.
    #[serde(rename = "pubDate")]
    pub published_at: String,
    pub summary: String,
}

/// Classification of a per-URL failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyUrl,
    Request,
    Transport,
    HttpStatus,
    BodyRead,
    Parse,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EmptyUrl => "empty-url",
            ErrorKind::Request => "request-error",
            ErrorKind::Transport => "transport-error",
            ErrorKind::HttpStatus => "http-status-error",
            ErrorKind::BodyRead => "body-read-error",
            ErrorKind::Parse => "parse-error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed URL, as reported to the caller.
///
/// `kind` is kept for programmatic callers; only `url` and `message` are
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedFailure {
    pub url: String,
    pub message: String,
    #[serde(skip)]
    pub kind: Option<ErrorKind>,
}

impl FeedFailure {
    pub fn new(url: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            kind: Some(kind),
        }
    }
}

/// Input to a batch: URLs in caller order, duplicates and empty strings included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Output of a batch.
///
/// Both lists are `None` (serialized as `null`) only when the request held
/// no URLs; otherwise both are present, and
/// `feeds.len() + errors.len() == urls.len()`. Entries appear in completion
/// order, which callers must not rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub feeds: Option<Vec<FeedRecord>>,
    pub errors: Option<Vec<FeedFailure>>,
}

impl BatchResult {
    /// The "no input" result: neither list is present.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Result for a request body that could not be decoded.
    pub fn invalid_request() -> Self {
        Self {
            feeds: None,
            errors: Some(vec![FeedFailure {
                url: String::new(),
                message: "invalid request".to_string(),
                kind: None,
            }]),
        }
    }

    /// Partition outcomes, keeping their arrival order within each list.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<FeedRecord, FeedFailure>>,
    {
        let mut feeds = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(feed) => feeds.push(feed),
                Err(failure) => errors.push(failure),
            }
        }
        Self {
            feeds: Some(feeds),
            errors: Some(errors),
        }
    }

    pub fn feeds(&self) -> &[FeedRecord] {
        self.feeds.as_deref().unwrap_or_default()
    }

    pub fn errors(&self) -> &[FeedFailure] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// Total number of outcomes (one per requested URL).
    pub fn len(&self) -> usize {
        self.feeds().len() + self.errors().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reorder both lists by URL for deterministic output.
    pub fn sort_by_url(&mut self) {
        if let Some(feeds) = self.feeds.as_mut() {
            feeds.sort_by(|a, b| a.feed_url.cmp(&b.feed_url));
        }
        if let Some(errors) = self.errors.as_mut() {
            errors.sort_by(|a, b| a.url.cmp(&b.url));
        }
    }
}
