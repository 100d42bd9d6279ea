//! Gateway integration tests: local routes driven in-process, upstream stubbed.

mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{closed_port_url, start_slow_stub_upstream, start_stub_upstream, test_gateway};
use drift_gateway::http::{ErrorBody, X_REQUEST_ID};

async fn send(app: Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn json_of(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn test_list_route_forwards_with_coerced_query() {
    let stub = start_stub_upstream(200, r#"{"stations":["s1"]}"#).await;
    let app = test_gateway(&stub.base_url());

    let (status, body) = send(app, "GET", "/stations?include_config=yes&page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!({"stations": ["s1"]}));

    let req = stub.single();
    assert_eq!(req.path, "/v1/stations");
    assert_eq!(req.query_value("include_config"), Some("true"));
    assert_eq!(req.query_value("page"), Some("2"));
    assert_eq!(req.query_value("page_size"), Some("100"));
}

#[tokio::test]
async fn test_bad_query_value_is_rejected_locally() {
    let stub = start_stub_upstream(200, "{}").await;
    let app = test_gateway(&stub.base_url());

    let (status, body) = send(app.clone(), "GET", "/stations?page=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.error, "invalid_argument");
    assert_eq!(err.operation, "get_stations");

    let (status, _) = send(app, "GET", "/stations?include_config=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_undeclared_query_params_are_dropped() {
    let stub = start_stub_upstream(200, "{}").await;
    let app = test_gateway(&stub.base_url());

    let (status, _) = send(app.clone(), "GET", "/users?bogus=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(app, "GET", "/stations?_=1700000000&page=4", None).await;
    assert_eq!(status, StatusCode::OK);

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].query_value("bogus").is_none());
    assert_eq!(requests[0].query.len(), 4);
    assert!(requests[1].query_value("_").is_none());
    assert_eq!(requests[1].query_value("page"), Some("4"));
}

#[tokio::test]
async fn test_literal_user_routes_fall_through_to_user_id() {
    let stub = start_stub_upstream(200, "{}").await;
    let app = test_gateway(&stub.base_url());

    let (status, _) = send(app.clone(), "GET", "/users/login", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(app.clone(), "DELETE", "/users/login-server", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(app, "POST", "/users/login", Some(r#"{"user":"pilot"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let requests = stub.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!((requests[0].method.as_str(), requests[0].path.as_str()), ("GET", "/v1/users/login"));
    assert_eq!(requests[0].query_value("include_bans"), Some("false"));
    assert_eq!((requests[1].method.as_str(), requests[1].path.as_str()), ("DELETE", "/users/login-server"));
    assert_eq!((requests[2].method.as_str(), requests[2].path.as_str()), ("POST", "/users/log_in"));
}

#[tokio::test]
async fn test_abandoned_request_still_completes_upstream() {
    let stub = start_slow_stub_upstream(200, "{}", Duration::from_millis(300)).await;
    let app = test_gateway(&stub.base_url());

    let request = Request::builder()
        .method("DELETE")
        .uri("/stations/s1")
        .body(Body::empty())
        .unwrap();
    let abandoned = tokio::time::timeout(Duration::from_millis(50), app.oneshot(request)).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(800)).await;
    let req = stub.single();
    assert_eq!(req.method, "DELETE");
    assert_eq!(req.path, "/stations/s1");
}

#[tokio::test]
async fn test_empty_upstream_body_is_bad_gateway() {
    let stub = start_stub_upstream(204, "").await;
    let app = test_gateway(&stub.base_url());

    let (status, body) = send(app, "DELETE", "/stations/s1", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.error, "upstream_call_failed");
}

#[tokio::test]
async fn test_shared_local_path_dispatches_by_method() {
    let stub = start_stub_upstream(200, "{}").await;
    let app = test_gateway(&stub.base_url());

    send(app.clone(), "GET", "/users", None).await;
    send(app.clone(), "POST", "/users", Some(r#"{"name":"pilot"}"#)).await;
    let (status, _) = send(app, "PUT", "/users", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!((requests[0].method.as_str(), requests[0].path.as_str()), ("GET", "/v1/users"));
    assert_eq!((requests[1].method.as_str(), requests[1].path.as_str()), ("POST", "/users"));
    assert_eq!(requests[1].body, Some(json!({"name": "pilot"})));
}

#[tokio::test]
async fn test_ban_route() {
    let stub = start_stub_upstream(200, r#"{"banned":true}"#).await;
    let app = test_gateway(&stub.base_url());

    let (status, body) = send(
        app.clone(),
        "POST",
        "/stations/s1/ban/u1?duration=1d&reason=spam",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body), json!({"banned": true}));

    let req = stub.single();
    assert_eq!(req.path, "/v1/stations/s1/users/u1/ban");
    assert_eq!(req.query_value("duration"), Some("1d"));
    assert_eq!(req.body, Some(json!({"reason": "spam"})));

    let (status, _) = send(app, "POST", "/stations/s1/ban/u1?reason=spam", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stub.requests().len(), 1);
}

#[tokio::test]
async fn test_body_routes_require_json_object() {
    let stub = start_stub_upstream(200, "{}").await;
    let app = test_gateway(&stub.base_url());

    let (status, _) = send(app.clone(), "POST", "/stations", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(app.clone(), "POST", "/stations", Some("[1,2]")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(app, "POST", "/stations", Some("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_delete_station_config_carries_body() {
    let stub = start_stub_upstream(200, "{}").await;
    let app = test_gateway(&stub.base_url());

    let (status, _) = send(app, "DELETE", "/stations/s9/config", Some(r#"{"keys":["motd"]}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let req = stub.single();
    assert_eq!(req.method, "DELETE");
    assert_eq!(req.path, "/stations/s9/config");
    assert_eq!(req.body, Some(json!({"keys": ["motd"]})));
}

#[tokio::test]
async fn test_upstream_status_is_relayed() {
    let stub = start_stub_upstream(404, r#"{"detail":"no such user"}"#).await;
    let app = test_gateway(&stub.base_url());

    let (status, body) = send(app, "GET", "/users/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.error, "upstream_call_failed");
    assert_eq!(err.status, 404);
    assert_eq!(err.operation, "get_user");
    assert!(err.detail.contains("no such user"));
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let app = test_gateway(&closed_port_url().await);

    let (status, body) = send(app, "GET", "/users", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let err: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.error, "upstream_call_failed");
    assert_eq!(err.status, 502);
}

#[tokio::test]
async fn test_debug_and_status_pages() {
    let stub = start_stub_upstream(200, "{}").await;
    let app = test_gateway(&stub.base_url());

    let (status, body) = send(app.clone(), "GET", "/debug", None).await;
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains("<html"));
    assert!(page.contains("fetch("));

    let (status, body) = send(app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    let doc = json_of(&body);
    assert_eq!(doc["name"], "drift-gateway");
    assert_eq!(doc["operations"], 28);

    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let stub = start_stub_upstream(200, "{}").await;
    let app = test_gateway(&stub.base_url());

    let request = Request::builder()
        .uri("/status")
        .header(X_REQUEST_ID, "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "req-42");

    let request = Request::builder().uri("/status").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.headers().contains_key(X_REQUEST_ID));
}
