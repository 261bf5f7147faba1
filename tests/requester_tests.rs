//! Integration tests for the request engine.
//!
//! These tests run the default reqwest transport against a wiremock server
//! and verify request construction, response decoding, pagination and the
//! retry/failure behavior.

use std::io::Write;
use std::time::Duration;

use elympics_api::{
    ApiKey, ElympicsConfig, Endpoint, Fetched, HttpError, RateLimitPolicy, Requester,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Entry {
    id: u32,
}

/// Creates a configuration pointing at the mock server.
fn config_for(server: &MockServer) -> ElympicsConfig {
    ElympicsConfig::builder()
        .endpoint(Endpoint::new(server.uri()).unwrap())
        .key(ApiKey::new("test-key").unwrap())
        .build()
        .unwrap()
}

fn entries(ids: std::ops::Range<u32>) -> serde_json::Value {
    json!(ids.map(|id| json!({ "id": id })).collect::<Vec<_>>())
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

// ============================================================================
// Request construction
// ============================================================================

#[tokio::test]
async fn test_get_sends_encoded_parameters_in_query_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("name", "ann & bob"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config)
        .method("GET")
        .with("name", "ann & bob")
        .with("limit", 10)
        .send("/lookup")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("name=ann%20%26%20bob&limit=10"));
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_delete_keeps_existing_query_separator() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config)
        .method("DELETE")
        .with("id", 7)
        .send("/entries?board=main")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("board=main&id=7"));
}

#[tokio::test]
async fn test_post_sends_unescaped_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submitHighscore"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string("name=ann & bob&score=100"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config)
        .with("name", "ann & bob")
        .with("score", 100)
        .send("/submitHighscore")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn test_in_body_forces_body_for_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(body_string("q=top"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config)
        .method("GET")
        .in_body()
        .with("q", "top")
        .send("/search")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_overrides_first_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/x"))
        .and(body_string("a=3&b=2&a=9"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config)
        .with("a", 1)
        .with("b", 2)
        .with("a", 9)
        .set("a", 3)
        .send("/x")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_absent_parameter_values_are_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/x"))
        .and(body_string("kept=yes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config)
        .with_opt("dropped", None::<&str>)
        .with_opt("kept", Some("yes"))
        .send("/x")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_key_and_encoding_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/x"))
        .and(header("key", "test-key"))
        .and(header("Accept-Encoding", "gzip"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config).send("/x").await.unwrap();
}

#[tokio::test]
async fn test_anonymous_calls_omit_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/x"))
        .and(header_exists("key"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ElympicsConfig::builder()
        .endpoint(Endpoint::new(server.uri()).unwrap())
        .build()
        .unwrap();
    Requester::new(&config).send("/x").await.unwrap();
}

#[tokio::test]
async fn test_patch_verb_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/entries/1"))
        .and(body_string("score=5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config)
        .method("PATCH")
        .with("score", 5)
        .send("/entries/1")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_raw_body_replaces_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upload"))
        .and(header("Content-Type", "application/json"))
        .and(body_string(r#"{"id":1}"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config)
        .method("PUT")
        .content_type("application/json")
        .with("ignored", true)
        .body(std::io::Cursor::new(br#"{"id":1}"#.to_vec()))
        .send("/upload")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_absolute_tail_is_used_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ElympicsConfig::builder()
        .endpoint(Endpoint::new("http://127.0.0.1:1/unused").unwrap())
        .build()
        .unwrap();
    let tail = format!("{}/elsewhere", server.uri());
    Requester::new(&config)
        .method("GET")
        .send(&tail)
        .await
        .unwrap();
}

// ============================================================================
// Response handling
// ============================================================================

#[tokio::test]
async fn test_fetch_decodes_and_ignores_unknown_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4, "extra": "x"})))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let entry: Fetched<Entry> = Requester::new(&config)
        .method("GET")
        .fetch("/entry")
        .await
        .unwrap();

    assert_eq!(entry, Fetched::Value(Entry { id: 4 }));
}

#[tokio::test]
async fn test_not_modified_is_distinct_signal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entry"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let entry: Fetched<Entry> = Requester::new(&config)
        .method("GET")
        .fetch("/entry")
        .await
        .unwrap();
    assert!(entry.is_not_modified());

    let mut cached = Entry { id: 1 };
    Requester::new(&config)
        .method("GET")
        .update("/entry", &mut cached)
        .await
        .unwrap();
    assert_eq!(cached, Entry { id: 1 });

    let list: Fetched<Vec<Entry>> = Requester::new(&config)
        .method("GET")
        .fetch_all("/entry")
        .await
        .unwrap();
    assert_eq!(list, Fetched::NotModified);
}

#[tokio::test]
async fn test_no_content_yields_empty_sequence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getHighscores"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let list: Fetched<Vec<Entry>> = Requester::new(&config)
        .fetch_all("/getHighscores")
        .await
        .unwrap();

    assert_eq!(list, Fetched::Value(Vec::new()));
}

#[tokio::test]
async fn test_update_overwrites_fields_in_place() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Board {
        title: String,
        size: u32,
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/board"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"size": 50})))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let mut board = Board {
        title: "weekly".to_string(),
        size: 10,
    };
    Requester::new(&config)
        .method("GET")
        .update("/board", &mut board)
        .await
        .unwrap();

    assert_eq!(
        board,
        Board {
            title: "weekly".to_string(),
            size: 50
        }
    );
}

#[tokio::test]
async fn test_gzip_body_is_decompressed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entry"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(gzip(r#"{"id":9}"#)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server);
    let entry: Fetched<Entry> = Requester::new(&config)
        .method("GET")
        .fetch("/entry")
        .await
        .unwrap();

    assert_eq!(entry, Fetched::Value(Entry { id: 9 }));
}

#[tokio::test]
async fn test_unsupported_encoding_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entry"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "br")
                .set_body_bytes(vec![1, 2, 3]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result: Result<Fetched<Entry>, _> =
        Requester::new(&config).method("GET").fetch("/entry").await;

    match result {
        Err(HttpError::UnsupportedEncoding { encoding }) => assert_eq!(encoding, "br"),
        other => panic!("expected unsupported encoding, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_reports_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entry"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result: Result<Fetched<Entry>, _> =
        Requester::new(&config).method("GET").fetch("/entry").await;

    match result {
        Err(HttpError::Decode(e)) => assert_eq!(e.payload, "<html>oops</html>"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_status_code_and_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8, 159, 146, 150]))
        .mount(&server)
        .await;

    let config = config_for(&server);

    let status = Requester::new(&config).status_code("/health").await.unwrap();
    assert_eq!(status, 503);

    let bytes = Requester::new(&config).bytes("/raw").await.unwrap();
    assert_eq!(bytes, vec![0u8, 159, 146, 150]);
}

#[tokio::test]
async fn test_response_exposes_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/getHighscores"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Board-Version", "42")
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(gzip(r#"[{"id":1}]"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let response = Requester::new(&config)
        .method("GET")
        .response("/getHighscores")
        .await
        .unwrap();

    assert_eq!(response.code, 200);
    assert_eq!(response.header("x-board-version"), Some("42"));
    assert_eq!(response.text().unwrap(), r#"[{"id":1}]"#);
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_pagination_concatenates_pages_in_order() {
    let server = MockServer::start().await;
    let next = format!("<{}/getHighscores/page/2>; rel=\"next\"", server.uri());

    Mock::given(method("POST"))
        .and(path("/getHighscores"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", next.as_str())
                .set_body_json(entries(0..3)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getHighscores/page/2"))
        .and(body_string("board=main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries(3..5)))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let list: Fetched<Vec<Entry>> = Requester::new(&config)
        .with("board", "main")
        .fetch_all("/getHighscores")
        .await
        .unwrap();

    let ids: Vec<u32> = list.into_option().unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_pagination_follows_link_with_comma_in_query() {
    let server = MockServer::start().await;
    let next = format!("<{}/list?ids=1,2&page=2>; rel=\"next\"", server.uri());

    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .and(query_param("ids", "1,2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries(2..4)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", next.as_str())
                .set_body_json(entries(0..2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let list: Fetched<Vec<Entry>> = Requester::new(&config)
        .method("GET")
        .fetch_all("/list")
        .await
        .unwrap();

    let ids: Vec<u32> = list.into_option().unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_page_limit_stops_pagination() {
    let server = MockServer::start().await;
    let next = format!("<{}/loop>; rel=\"next\"", server.uri());

    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", next.as_str())
                .set_body_json(entries(0..1)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = ElympicsConfig::builder()
        .endpoint(Endpoint::new(server.uri()).unwrap())
        .max_pages(2)
        .build()
        .unwrap();
    let result: Result<Fetched<Vec<Entry>>, _> =
        Requester::new(&config).method("GET").fetch_all("/loop").await;

    assert!(matches!(
        result,
        Err(HttpError::PageLimitExceeded { max_pages: 2, .. })
    ));
}

// ============================================================================
// Retry and failure classification
// ============================================================================

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submitHighscore"))
        .respond_with(ResponseTemplate::new(403).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submitHighscore"))
        .and(body_string("name=ann&score=1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    Requester::new(&config)
        .with("name", "ann")
        .with("score", 1)
        .send("/submitHighscore")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bounded_retries_fail_when_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(403).insert_header("Retry-After", "1"))
        .expect(3)
        .mount(&server)
        .await;

    let config = ElympicsConfig::builder()
        .endpoint(Endpoint::new(server.uri()).unwrap())
        .rate_limit_policy(
            RateLimitPolicy::default()
                .max_retries(2)
                .backoff(Duration::from_millis(5)),
        )
        .build()
        .unwrap();
    let result = Requester::new(&config).method("GET").send("/busy").await;

    match result {
        Err(HttpError::MaxRetries(e)) => {
            assert_eq!(e.code, 403);
            assert_eq!(e.tries, 2);
        }
        other => panic!("expected max retries, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getHighscores"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("Retry-After", "0")
                .set_body_string("bad key"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result = Requester::new(&config).send("/getHighscores").await;

    match result {
        Err(HttpError::Api(e)) => {
            assert_eq!(e.code(), 401);
            assert!(e.url.ends_with("/getHighscores"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_without_retry_after_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(403).set_body_string("banned"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = Requester::new(&config).send("/x").await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert!(err.to_string().contains("banned"));
}

#[tokio::test]
async fn test_not_found_carries_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such board"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = Requester::new(&config)
        .method("GET")
        .send("/missing")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        HttpError::NotFound(e) => assert_eq!(e.error_body.as_deref(), Some("no such board")),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_carries_status_reason_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = Requester::new(&config).send("/x").await.unwrap_err();

    match err {
        HttpError::Api(e) => {
            assert_eq!(e.code(), 500);
            assert_eq!(e.message.as_deref(), Some("Internal Server Error"));
            assert_eq!(e.error_body.as_deref(), Some("database unavailable"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let config = ElympicsConfig::builder()
        .endpoint(Endpoint::new("http://127.0.0.1:1").unwrap())
        .timeouts(Duration::from_millis(200), Duration::from_millis(200))
        .build()
        .unwrap();

    let err = Requester::new(&config).send("/x").await.unwrap_err();
    assert!(matches!(err, HttpError::Transport { .. }));
}
