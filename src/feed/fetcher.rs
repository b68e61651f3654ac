use crate::config::FetchSettings;
use crate::feed::parser::{normalize, parse_feed};
use crate::feed::types::{BatchResult, ErrorKind, FeedFailure, FeedRecord};
use crate::util::{error_chain, validate_url, HostPolicy};
use futures::stream::{self, StreamExt};
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while fetching a single feed URL.
///
/// Every variant maps onto one [`ErrorKind`]; none of them ever escapes a
/// batch, they are reported as [`FeedFailure`] entries instead.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL string was empty
    #[error("URL is empty")]
    EmptyUrl,
    /// The URL was malformed or the request could not be built
    #[error("request error: {0}")]
    Request(String),
    /// Network failure, timeout, cancellation or redirect limit
    #[error("transport error: {0}")]
    Transport(String),
    /// Response status other than 200 OK
    #[error("HTTP error: status {code} {reason}")]
    HttpStatus { code: u16, reason: String },
    /// Reading the response body failed or exceeded the size limit
    #[error("body read error: {0}")]
    BodyRead(String),
    /// Body was not an Atom/RSS/RDF document
    #[error("parse error: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::EmptyUrl => ErrorKind::EmptyUrl,
            FetchError::Request(_) => ErrorKind::Request,
            FetchError::Transport(_) => ErrorKind::Transport,
            FetchError::HttpStatus { .. } => ErrorKind::HttpStatus,
            FetchError::BodyRead(_) => ErrorKind::BodyRead,
            FetchError::Parse(_) => ErrorKind::Parse,
        }
    }

    /// Converts into the per-URL record handed back to callers.
    pub fn into_failure(self, url: &str) -> FeedFailure {
        FeedFailure::new(url, self.kind(), self.to_string())
    }

    fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Transport(format!("request timed out: {}", error_chain(err)))
        } else {
            FetchError::Transport(error_chain(err))
        }
    }

    fn http_status(status: StatusCode) -> Self {
        FetchError::HttpStatus {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

/// Decides whether the redirect to `target` may be followed.
///
/// `hops` is the length of `previous()`, which already includes the URL that
/// answered with the redirect, so it is `n` while the n-th redirect is being
/// considered. The target must pass the same host policy as the first URL.
fn check_redirect(
    hops: usize,
    max: usize,
    target: &str,
    policy: HostPolicy,
) -> Result<(), String> {
    if hops > max {
        return Err(format!("stopped after {max} redirects"));
    }
    validate_url(target, policy)
        .map(|_| ())
        .map_err(|e| format!("redirect to {target} rejected: {e}"))
}

fn redirect_policy(max: usize, policy: HostPolicy) -> Policy {
    Policy::custom(move |attempt| {
        let hops = attempt.previous().len();
        if let Err(reason) = check_redirect(hops, max, attempt.url().as_str(), policy) {
            return attempt.error(reason);
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %attempt.url(),
            hop = hops,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Fetches and normalizes feeds.
///
/// Holds one HTTP client (timeout and redirect policy baked in) and the
/// settings it was built from. Cloning is cheap and every clone shares the
/// same connection pool, so a single value can serve every request of a
/// process.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    settings: Arc<FetchSettings>,
}

impl FeedFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, reqwest::Error> {
        let policy = HostPolicy::from_allow_private(settings.allow_private_hosts);
        let client = reqwest::Client::builder()
            .redirect(redirect_policy(settings.max_redirects, policy))
            .timeout(settings.timeout())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Fetches every URL concurrently and partitions the outcomes.
    ///
    /// # Returns
    ///
    /// A [`BatchResult`] holding exactly one entry per input URL, in
    /// completion order (not input order). For an empty `urls` both lists
    /// are `None` and nothing is spawned.
    ///
    /// # Behavior
    ///
    /// - One in-flight fetch per URL unless `max_concurrency` caps the fan-out
    /// - No batch-level deadline: each fetch is bounded by the client timeout
    /// - A failing URL never affects its siblings
    /// - Cancelling `cancel` makes every unfinished fetch resolve to a
    ///   transport error, so the batch still returns promptly and complete
    pub async fn fetch_all(&self, urls: &[String], cancel: &CancellationToken) -> BatchResult {
        if urls.is_empty() {
            return BatchResult::empty();
        }

        let total = urls.len();
        let concurrency = self.settings.concurrency_for(total);
        let started = Instant::now();

        // Each future owns its inputs; borrowed ones fail axum's handler lifetime bounds
        let outcomes: Vec<Result<FeedRecord, FeedFailure>> = stream::iter(urls.to_vec())
            .map(|url| {
                let fetcher = self.clone();
                let cancel = cancel.clone();
                async move {
                    fetcher
                        .fetch_one(&url, &cancel)
                        .await
                        .map_err(|e| e.into_failure(&url))
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let result = BatchResult::from_outcomes(outcomes);
        debug_assert_eq!(result.len(), total);

        tracing::info!(
            total = total,
            succeeded = result.feeds().len(),
            failed = result.errors().len(),
            concurrency = concurrency,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch fetch complete"
        );

        result
    }

    /// Fetches one URL and normalizes the document.
    ///
    /// # Errors
    ///
    /// - [`FetchError::EmptyUrl`] - `url` is empty
    /// - [`FetchError::Request`] - malformed URL, disallowed scheme/host, or unbuildable request
    /// - [`FetchError::Transport`] - connection failure, timeout, cancellation, or redirect cap
    /// - [`FetchError::HttpStatus`] - any status other than 200
    /// - [`FetchError::BodyRead`] - body stream failed or exceeded `max_body_bytes`
    /// - [`FetchError::Parse`] - body is not an Atom/RSS/RDF document
    pub async fn fetch_one(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FeedRecord, FetchError> {
        if url.is_empty() {
            tracing::warn!("Rejected empty feed URL");
            return Err(FetchError::EmptyUrl);
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Transport("request cancelled".to_string())),
            result = self.fetch_and_parse(url) => result,
        };

        match &result {
            Ok(feed) => tracing::debug!(
                url = %url,
                title = %feed.title,
                articles = feed.articles.len(),
                "Fetched feed"
            ),
            Err(e) => tracing::warn!(url = %url, kind = %e.kind(), error = %e, "Feed fetch failed"),
        }

        result
    }

    async fn fetch_and_parse(&self, url: &str) -> Result<FeedRecord, FetchError> {
        validate_url(url, HostPolicy::from_allow_private(self.settings.allow_private_hosts))
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let request = self
            .client
            .get(url)
            .header(USER_AGENT, self.settings.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Request(error_chain(&e)))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| FetchError::transport(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::http_status(status));
        }

        let bytes = read_limited_bytes(response, self.settings.max_body_bytes).await?;

        let document = parse_feed(&bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(normalize(document, url))
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::BodyRead(format!(
                "response body of {len} bytes exceeds limit of {limit} bytes"
            )));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        // The client timeout spans the body too; a stall here is still a transport failure
        let chunk = chunk.map_err(|e| {
            if e.is_timeout() {
                FetchError::transport(&e)
            } else {
                FetchError::BodyRead(error_chain(&e))
            }
        })?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::BodyRead(format!(
                "response body exceeds limit of {limit} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
