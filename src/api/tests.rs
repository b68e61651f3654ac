use super::*;
use crate::config::FetchSettings;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot()
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Success Feed</title>
    <link>https://example.com/home</link>
    <item><title>Hello</title><link>https://example.com/hello</link></item>
</channel></rss>"#;

fn test_router(origins: CorsOrigins) -> Router {
    let fetcher = FeedFetcher::new(FetchSettings::default()).unwrap();
    create_router(AppState::new(fetcher, CancellationToken::new()), &origins)
}

fn parse_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/parse")
        .header("Content-Type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_parse_mixed_batch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(wiremock::matchers::path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(wiremock::matchers::path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let ok_url = format!("{}/ok", mock_server.uri());
    let missing_url = format!("{}/missing", mock_server.uri());
    let body = json!({ "urls": [ok_url, missing_url, ""] }).to_string();

    let response = test_router(CorsOrigins::Any)
        .oneshot(parse_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let value = body_json(response).await;
    let feeds = value["feeds"].as_array().unwrap();
    let errors = value["errors"].as_array().unwrap();
    assert_eq!(feeds.len(), 1);
    assert_eq!(errors.len(), 2);

    assert_eq!(feeds[0]["title"], "Success Feed");
    assert_eq!(feeds[0]["feedUrl"], ok_url);
    assert_eq!(feeds[0]["articles"][0]["title"], "Hello");

    let mut error_urls: Vec<&str> = errors.iter().map(|e| e["url"].as_str().unwrap()).collect();
    error_urls.sort();
    assert_eq!(error_urls, vec!["", missing_url.as_str()]);
    assert!(errors.iter().all(|e| e.get("kind").is_none()));
}

#[tokio::test]
async fn test_parse_empty_list_returns_nulls() {
    let response = test_router(CorsOrigins::Any)
        .oneshot(parse_request(r#"{"urls": []}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"feeds": null, "errors": null}));
}

#[tokio::test]
async fn test_parse_missing_urls_field_treated_as_empty() {
    let response = test_router(CorsOrigins::Any)
        .oneshot(parse_request("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"feeds": null, "errors": null}));
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let response = test_router(CorsOrigins::Any)
        .oneshot(parse_request("{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"feeds": null, "errors": [{"url": "", "message": "invalid request"}]})
    );
}

#[tokio::test]
async fn test_wrong_urls_type_is_400() {
    let response = test_router(CorsOrigins::Any)
        .oneshot(parse_request(r#"{"urls": "https://example.com/feed"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_content_type_accepted() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/parse")
        .body(Body::from(r#"{"urls": [""]}"#))
        .unwrap();

    let response = test_router(CorsOrigins::Any).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["feeds"], json!([]));
    assert_eq!(value["errors"][0]["url"], "");
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let request = Request::builder()
        .method("GET")
        .uri("/api/parse")
        .body(Body::empty())
        .unwrap();

    let response = test_router(CorsOrigins::Any).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_plain_options_is_ok() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/parse")
        .body(Body::empty())
        .unwrap();

    let response = test_router(CorsOrigins::Any).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight_any_origin() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/parse")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = test_router(CorsOrigins::Any).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    let methods = headers
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("OPTIONS"));
}

#[tokio::test]
async fn test_cors_origin_list() {
    let router = test_router(CorsOrigins::List(vec!["https://app.example".to_string()]));

    let allowed = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/parse")
                .header("Origin", "https://app.example")
                .body(Body::from(r#"{"urls": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "https://app.example"
    );

    let denied = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/parse")
                .header("Origin", "https://evil.example")
                .body(Body::from(r#"{"urls": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = test_router(CorsOrigins::Any)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["status"], "ok");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_shutdown_token_cancels_in_flight_batch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(VALID_RSS)
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let shutdown = CancellationToken::new();
    let fetcher = FeedFetcher::new(FetchSettings::default()).unwrap();
    let router = create_router(AppState::new(fetcher, shutdown.clone()), &CorsOrigins::Any);

    let canceller = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            shutdown.cancel();
        })
    };

    let body = json!({ "urls": [format!("{}/slow", mock_server.uri())] }).to_string();
    let started = std::time::Instant::now();
    let response = router.oneshot(parse_request(body)).await.unwrap();
    canceller.await.unwrap();

    assert!(started.elapsed() < std::time::Duration::from_secs(3));
    assert_eq!(response.status(), StatusCode::OK);
    let value = body_json(response).await;
    assert_eq!(value["feeds"], json!([]));
    let message = value["errors"][0]["message"].as_str().unwrap();
    assert!(message.contains("transport error"));
    assert!(message.contains("cancelled"));
}
