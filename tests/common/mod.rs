//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

use drift_gateway::config::GatewayConfig;
use drift_gateway::upstream::Credential;
use drift_gateway::{GatewayServer, UpstreamClient};

pub const TEST_KEY: &str = "test-api-key";

/// One request as the stub upstream saw it.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub api_key: Option<String>,
    pub body: Option<Value>,
}

impl CapturedRequest {
    #[allow(dead_code)]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: &'static str,
    delay: Duration,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// A stand-in for the upstream API that answers every request with a fixed
/// status and body and records what it received.
pub struct StubUpstream {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl StubUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }

    /// The only request received; panics unless exactly one arrived.
    #[allow(dead_code)]
    pub fn single(&self) -> CapturedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one upstream call, got {requests:?}");
        requests.into_iter().next().unwrap()
    }
}

/// Start a stub upstream on an ephemeral port.
pub async fn start_stub_upstream(status: u16, body: &'static str) -> StubUpstream {
    start_slow_stub_upstream(status, body, Duration::ZERO).await
}

/// Like [`start_stub_upstream`], but each request is answered, and only then
/// recorded, after `delay`.
#[allow(dead_code)]
pub async fn start_slow_stub_upstream(status: u16, body: &'static str, delay: Duration) -> StubUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));

    let state = StubState {
        status: StatusCode::from_u16(status).unwrap(),
        body,
        delay,
        captured: captured.clone(),
    };
    let app = Router::new().fallback(capture).with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubUpstream { addr, captured }
}

async fn capture(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let query = url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .collect();
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    state.captured.lock().unwrap().push(CapturedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
        api_key,
        body,
    });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body,
    )
}

/// A base URL nothing is listening on.
#[allow(dead_code)]
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Gateway configuration pointed at `base_url`.
pub fn test_config(base_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.base_url = base_url.to_string();
    config.upstream.system_proxy = false;
    config.upstream.credential = Some(Credential::new(TEST_KEY));
    config
}

#[allow(dead_code)]
pub fn test_client(base_url: &str) -> UpstreamClient {
    UpstreamClient::from_config(&test_config(base_url).upstream).unwrap()
}

/// The fully layered gateway router, forwarding to `base_url`.
#[allow(dead_code)]
pub fn test_gateway(base_url: &str) -> Router {
    let config = test_config(base_url);
    let client = Arc::new(UpstreamClient::from_config(&config.upstream).unwrap());
    GatewayServer::new(&config, client).unwrap().router()
}
