//! JSON HTTP front end for the batch fetcher.
//!
//! Decodes `{"urls": [...]}`, runs one batch, and encodes the
//! `{"feeds": [...], "errors": [...]}` result. Per-URL failures are reported
//! in the body; the status is 200 whenever the request itself was valid.

use crate::config::CorsOrigins;
use crate::feed::FeedFetcher;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod routes;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: FeedFetcher,
    /// Root token; every request works under a child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(fetcher: FeedFetcher, shutdown: CancellationToken) -> Self {
        Self { fetcher, shutdown }
    }
}

/// Create the API router.
///
/// # Routes
///
/// - `POST /api/parse` - Fetch a batch of feeds
/// - `OPTIONS /api/parse` - CORS preflight
/// - `GET /health` - Health check
///
/// Any other method on `/api/parse` is answered with 405.
pub fn create_router(state: AppState, origins: &CorsOrigins) -> Router {
    Router::new()
        .route(
            "/api/parse",
            post(routes::parse_feeds).options(routes::preflight),
        )
        .route("/health", get(routes::health_check))
        .with_state(state)
        .layer(build_cors_layer(origins))
        .layer(TraceLayer::new_for_http())
}

/// Build a CORS layer allowing `POST`/`OPTIONS` with a `Content-Type` header.
fn build_cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let allowed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(allowed))
        }
    }
}

/// Serve the API until `shutdown` is cancelled.
///
/// Cancelling the token also cancels every in-flight batch, whose remaining
/// fetches then resolve as transport errors before the connection drains.
pub async fn serve(
    bind_address: SocketAddr,
    fetcher: FeedFetcher,
    origins: &CorsOrigins,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = create_router(AppState::new(fetcher, shutdown.clone()), origins);

    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "API server listening (POST /api/parse, OPTIONS /api/parse)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

#[cfg(test)]
mod tests;
