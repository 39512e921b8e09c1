//! Integration tests for the HTTP/SSE server.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`
//! against a mock arXiv source and a temporary storage directory.

use arxiv_mcp_server::config::Settings;
use arxiv_mcp_server::events::{Event, RecvError, Subscription};
use arxiv_mcp_server::http::{router, AppState};
use arxiv_mcp_server::mcp::ToolRegistry;
use arxiv_mcp_server::models::PaperId;
use arxiv_mcp_server::sources::mock::make_paper;
use arxiv_mcp_server::sources::MockSource;
use arxiv_mcp_server::store::PaperStore;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use futures_util::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestServer {
    _dir: TempDir,
    store: PaperStore,
    state: AppState,
    app: Router,
}

fn server_with(source: MockSource) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        storage: arxiv_mcp_server::config::StorageConfig {
            path: dir.path().to_path_buf(),
        },
        ..Settings::default()
    };
    let store = PaperStore::new(dir.path());
    let tools = ToolRegistry::new(Arc::new(source), store.clone(), settings.max_results);
    let state = AppState::new(settings, tools);
    let app = router(state.clone());
    TestServer {
        _dir: dir,
        store,
        state,
        app,
    }
}

fn sample_papers(n: usize) -> Vec<arxiv_mcp_server::Paper> {
    (1..=n)
        .map(|i| make_paper(&format!("2301.{:05}v1", i), &format!("Quantum paper {}", i)))
        .collect()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn drain(sub: &mut Subscription) -> Vec<Event> {
    let mut events = Vec::new();
    loop {
        match sub.recv_timeout(Duration::from_millis(20)).await {
            Ok(event) => events.push(event),
            Err(RecvError::Timeout) => return events,
            Err(e) => panic!("unexpected {:?}", e),
        }
    }
}

fn kinds(events: &[Event]) -> Vec<String> {
    events.iter().map(|e| e.kind.to_string()).collect()
}

/// Parse the JSON carried by the first text content item
fn content_json(items: &Value) -> Value {
    serde_json::from_str(items[0]["text"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let server = server_with(MockSource::new());
    let (status, body) = get(&server.app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "arxiv-mcp-server");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    for endpoint in ["events", "tools", "prompts", "search", "download", "list", "read"] {
        assert_eq!(body["endpoints"][endpoint], format!("/{}", endpoint));
    }
}

#[tokio::test]
async fn test_tools_listing() {
    let server = server_with(MockSource::new());
    let (status, body) = get(&server.app, "/tools").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["search_papers", "download_paper", "list_papers", "read_paper"]
    );
    assert_eq!(body["tools"][0]["inputSchema"]["required"], json!(["query"]));
}

#[tokio::test]
async fn test_prompts_listing_and_rendering() {
    let server = server_with(MockSource::new());

    let (status, body) = get(&server.app, "/prompts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prompts"].as_array().unwrap().len(), 5);

    let (status, body) = get(&server.app, "/prompts/deep-paper-analysis?paper_id=2301.12345").await;
    assert_eq!(status, StatusCode::OK);
    let text = body["prompt"]["messages"][0]["content"]["text"].as_str().unwrap();
    assert!(text.contains("2301.12345"));

    let (status, body) = get(&server.app, "/prompts/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("unknown"));

    let (status, _) = get(&server.app, "/prompts/paper-analysis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_returns_at_most_max_results() {
    let server = server_with(MockSource::new().with_papers(sample_papers(8)));
    let mut sub = server.state.hub.subscribe();

    let (status, body) = post(
        &server.app,
        "/search",
        json!({"query": "quantum computing", "max_results": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert!(results.len() <= 5);
    for paper in results {
        assert!(paper["id"].is_string());
        assert!(paper["title"].is_string());
        assert!(paper["authors"].is_array());
        assert!(paper["url"].is_string());
    }

    let events = drain(&mut sub).await;
    assert_eq!(kinds(&events), vec!["search_started", "search_completed"]);
    assert_eq!(events[0].data["query"], "quantum computing");
    assert_eq!(events[1].data["results_count"], results.len());
}

#[tokio::test]
async fn test_search_future_date_is_empty_not_error() {
    let server = server_with(MockSource::new().with_papers(sample_papers(3)));
    let (status, body) = post(
        &server.app,
        "/search",
        json!({"query": "quantum computing", "date_from": "2099-01-01"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_search_without_query_is_rejected_input() {
    let server = server_with(MockSource::new().with_papers(sample_papers(3)));
    let mut sub = server.state.hub.subscribe();

    let (status, body) = post(&server.app, "/search", json!({"date_from": "2099-01-01"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Error: Invalid arguments"));
    assert!(error.contains("query"));

    let events = drain(&mut sub).await;
    assert_eq!(kinds(&events), vec!["search_started", "search_completed"]);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_request_still_completes_search() {
    let source = MockSource::new()
        .with_papers(sample_papers(2))
        .with_delay(Duration::from_secs(2));
    let server = server_with(source);
    let mut sub = server.state.hub.subscribe();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"query": "quantum"}).to_string()))
        .unwrap();
    let call = server.app.clone().oneshot(request);
    assert!(tokio::time::timeout(Duration::from_millis(300), call)
        .await
        .is_err());

    let mut events = Vec::new();
    while events.len() < 2 {
        match sub.recv_timeout(Duration::from_secs(5)).await {
            Ok(event) => events.push(event),
            Err(e) => panic!("expected two events, got {:?} after {:?}", kinds(&events), e),
        }
    }
    assert_eq!(kinds(&events), vec!["search_started", "search_completed"]);
}

#[tokio::test]
async fn test_search_bad_date_is_reported_in_body() {
    let server = server_with(MockSource::new().with_papers(sample_papers(3)));
    let mut sub = server.state.hub.subscribe();

    let (status, body) = post(
        &server.app,
        "/search",
        json!({"query": "x", "date_to": "the day after tomorrow"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Error: Invalid date format"));

    let events = drain(&mut sub).await;
    assert_eq!(kinds(&events), vec!["search_started", "search_completed"]);
}

#[tokio::test]
async fn test_unknown_tool_is_not_found() {
    let server = server_with(MockSource::new());
    let mut sub = server.state.hub.subscribe();

    let (status, body) = post(&server.app, "/tools/unknown_tool", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("unknown_tool"));

    let events = drain(&mut sub).await;
    assert_eq!(kinds(&events), vec!["tool_started", "tool_error"]);
}

#[tokio::test]
async fn test_generic_tool_call() {
    let server = server_with(MockSource::new().with_papers(sample_papers(2)));
    let mut sub = server.state.hub.subscribe();

    let (status, body) = post(&server.app, "/tools/search_papers", json!({"query": "q"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_json(&body["result"])["total_results"], 2);

    let events = drain(&mut sub).await;
    assert_eq!(kinds(&events), vec!["tool_started", "tool_completed"]);
    assert_eq!(events[0].data["tool"], "search_papers");
    assert_eq!(events[0].data["arguments"], json!({"query": "q"}));
}

#[tokio::test]
async fn test_read_missing_paper_is_text_error() {
    let server = server_with(MockSource::new());
    let (status, body) = post(&server.app, "/read", json!({"paper_id": "2301.00001"})).await;
    assert_eq!(status, StatusCode::OK);
    let text = body["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Error: Paper 2301.00001 not found in storage"));
}

#[tokio::test]
async fn test_read_stored_paper() {
    let server = server_with(MockSource::new());
    server
        .store
        .write(&PaperId::parse("2301.00001").unwrap(), "# Title\n\nBody")
        .await
        .unwrap();

    let (status, body) = post(&server.app, "/read", json!({"paper_id": "2301.00001"})).await;
    assert_eq!(status, StatusCode::OK);
    let result = content_json(&body["content"]);
    assert_eq!(result["status"], "success");
    assert_eq!(result["content"], "# Title\n\nBody");
}

#[tokio::test]
async fn test_download_failure_is_server_error() {
    let server = server_with(MockSource::new().failing("connection reset"));
    let mut sub = server.state.hub.subscribe();

    let (status, body) = post(&server.app, "/download", json!({"paper_id": "2301.00001"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("connection reset"));

    let events = drain(&mut sub).await;
    assert_eq!(kinds(&events), vec!["download_started", "download_error"]);
    assert_eq!(events[1].data["paper_id"], "2301.00001");
    assert!(events[1].data["error"].is_string());
}

#[tokio::test]
async fn test_download_already_available() {
    let server = server_with(MockSource::new());
    server
        .store
        .write(&PaperId::parse("2301.00001").unwrap(), "text")
        .await
        .unwrap();

    let (status, body) = post(&server.app, "/download", json!({"paper_id": "2301.00001"})).await;
    assert_eq!(status, StatusCode::OK);
    let result = content_json(&body["result"]);
    assert_eq!(result["status"], "success");
    assert_eq!(result["message"], "Paper already available");
}

#[tokio::test]
async fn test_list_papers() {
    let server = server_with(MockSource::new().with_papers(sample_papers(1)));
    server
        .store
        .write(&PaperId::parse("2301.00001").unwrap(), "text")
        .await
        .unwrap();
    let mut sub = server.state.hub.subscribe();

    let (status, body) = post(&server.app, "/list", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let listing = content_json(&body["papers"]);
    assert_eq!(listing["total_papers"], 1);
    assert_eq!(listing["papers"][0]["title"], "Quantum paper 1");

    let events = drain(&mut sub).await;
    assert_eq!(kinds(&events), vec!["list_started", "list_completed"]);
    assert_eq!(events[1].data["papers_count"], 1);
}

#[tokio::test]
async fn test_list_accepts_empty_body() {
    let server = server_with(MockSource::new());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/list")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&server.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_json(&body["papers"])["total_papers"], 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = server_with(MockSource::new());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&server.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_event_stream_delivers_queued_event() {
    let server = server_with(MockSource::new());
    post(&server.app, "/list", json!({})).await;

    let request = Request::builder().uri("/events").body(Body::empty()).unwrap();
    let response = server.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();
    let chunk = body.next().await.unwrap().unwrap();
    let text = std::str::from_utf8(&chunk).unwrap();
    let json = text
        .strip_prefix("data: ")
        .unwrap()
        .trim_end_matches('\n');
    let frame: Value = serde_json::from_str(json).unwrap();
    assert_eq!(frame["type"], "list_started");
    assert!(frame["timestamp"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = server_with(MockSource::new());
    let request = Request::builder()
        .uri("/tools")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = server.app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_servers_do_not_share_events() {
    let first = server_with(MockSource::new());
    let second = server_with(MockSource::new());
    let mut sub = second.state.hub.subscribe();

    post(&first.app, "/list", json!({})).await;
    assert!(drain(&mut sub).await.is_empty());
}
