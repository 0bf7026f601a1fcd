#![allow(clippy::unwrap_used)]
// Integration tests for `HttpClient` using wiremock.

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use plexstax_api::{CallRequest, Error, HttpClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(timeout: Duration) -> (MockServer, HttpClient) {
    let server = MockServer::start().await;
    let client = HttpClient::from_reqwest(reqwest::Client::new(), timeout);
    (server, client)
}

fn url(server: &MockServer, suffix: &str) -> Url {
    Url::parse(&format!("{}{suffix}", server.uri())).unwrap()
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn get_decodes_json() {
    let (server, client) = setup(Duration::from_secs(2)).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/system/status"))
        .and(header("x-api-key", "k3y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "4.0.1" })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CallRequest::get(url(&server, "/api/v3/system/status"))
        .api_key("k3y")
        .unwrap();
    let body: Value = client.call(request).await.unwrap();

    assert_eq!(body["version"], "4.0.1");
}

#[tokio::test]
async fn basic_auth_header_is_sent() {
    let (server, client) = setup(Duration::from_secs(2)).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CallRequest::post(url(&server, "/jsonrpc")).basic_auth("user", Some("pass".into()));
    let result: u64 = client.json_rpc(request, "status").await.unwrap();

    assert_eq!(result, 7);
}

#[tokio::test]
async fn json_rpc_sends_method_envelope() {
    let (server, client) = setup(Duration::from_secs(2)).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .and(body_json(json!({ "method": "listgroups", "params": [], "id": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": [{}, {}] })))
        .mount(&server)
        .await;

    let groups: Vec<Value> = client
        .json_rpc(CallRequest::post(url(&server, "/jsonrpc")), "listgroups")
        .await
        .unwrap();

    assert_eq!(groups.len(), 2);
}

// ── Failure taxonomy ────────────────────────────────────────────────

#[tokio::test]
async fn non_success_status_maps_to_http_status() {
    let (server, client) = setup(Duration::from_secs(2)).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/queue"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance window"))
        .mount(&server)
        .await;

    let result: Result<Value, Error> = client.call(CallRequest::get(url(&server, "/api/v3/queue"))).await;
    let err = result.unwrap_err();

    assert!(
        matches!(err, Error::HttpStatus { status: 503, ref snippet, .. } if snippet == "maintenance window"),
        "expected HttpStatus 503, got: {err:?}"
    );
    assert_eq!(err.to_string(), "HTTP 503 Service Unavailable: maintenance window");
}

#[tokio::test]
async fn slow_remote_times_out() {
    let (server, client) = setup(Duration::from_millis(100)).await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let started = Instant::now();
    let result: Result<Value, Error> = client.call(CallRequest::get(url(&server, "/slow"))).await;
    let err = result.unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 100 }), "got: {err:?}");
    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(1), "call was not aborted at the bound");
}

#[tokio::test]
async fn per_call_bound_overrides_default() {
    let (server, client) = setup(Duration::from_secs(5)).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/system/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let request = CallRequest::get(url(&server, "/api/v3/system/status")).timeout(Duration::from_millis(50));
    let result: Result<Value, Error> = client.call(request).await;

    assert!(matches!(result, Err(Error::Timeout { timeout_ms: 50 })), "got: {result:?}");
}

#[tokio::test]
async fn fast_call_within_bound_succeeds() {
    let (server, client) = setup(Duration::from_millis(500)).await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true }))
                .set_delay(Duration::from_millis(20)),
        )
        .mount(&server)
        .await;

    let result: Result<Value, Error> = client.call(CallRequest::get(url(&server, "/ok"))).await;
    assert_ok!(result);
}

#[tokio::test]
async fn invalid_json_maps_to_deserialization() {
    let (server, client) = setup(Duration::from_secs(2)).await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result: Result<Value, Error> = client.call(CallRequest::get(url(&server, "/html"))).await;

    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body.contains("login")),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn refused_connection_maps_to_transport() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = HttpClient::from_reqwest(reqwest::Client::new(), Duration::from_secs(2));
    let target = Url::parse(&format!("http://127.0.0.1:{port}/api")).unwrap();

    let result: Result<Value, Error> = client.call(CallRequest::get(target)).await;

    assert!(matches!(result, Err(Error::Transport(_))), "got: {result:?}");
}

#[tokio::test]
async fn transport_error_hides_query_string_key() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = HttpClient::from_reqwest(reqwest::Client::new(), Duration::from_secs(2));
    let target =
        Url::parse(&format!("http://127.0.0.1:{port}/api?mode=queue&apikey=SUPERSECRET")).unwrap();

    let err = assert_err!(client.call::<Value>(CallRequest::get(target)).await);

    let shown = format!("{err} / {err:?}");
    assert!(!shown.contains("SUPERSECRET"), "key leaked: {shown}");
    assert!(!shown.contains("apikey"), "query leaked: {shown}");
}

#[tokio::test]
async fn json_rpc_error_member_maps_to_rpc() {
    let (server, client) = setup(Duration::from_secs(2)).await;

    Mock::given(method("POST"))
        .and(path("/jsonrpc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": null,
            "error": { "name": "JSONRPCError", "code": 1, "message": "Access denied" }
        })))
        .mount(&server)
        .await;

    let result: Result<Value, Error> = client
        .json_rpc(CallRequest::post(url(&server, "/jsonrpc")), "status")
        .await;

    assert!(
        matches!(result, Err(Error::Rpc { ref message }) if message == "Access denied"),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn shutdown_cancels_in_flight_call() {
    let server = MockServer::start().await;
    let shutdown = CancellationToken::new();
    let client = HttpClient::from_reqwest(reqwest::Client::new(), Duration::from_secs(5))
        .with_shutdown(shutdown.clone());

    Mock::given(method("GET"))
        .and(path("/hang"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result: Result<Value, Error> = client.call(CallRequest::get(url(&server, "/hang"))).await;
    let err = assert_err!(result);
    assert!(matches!(err, Error::Cancelled), "got: {err:?}");
}
