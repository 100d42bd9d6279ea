//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: one route per endpoint table row
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind arguments and dispatch each request to the upstream client
//! - Relay the upstream JSON, or map the failure to a local error
//! - Serve until the shutdown signal fires
//!
//! # Design Decisions
//! - No local timeout: the outbound call runs under reqwest defaults only
//! - A dispatched upstream call runs on its own task and outlives a caller
//!   that hangs up
//! - Undeclared query parameters are dropped, not rejected

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodFilter, MethodRouter},
    Json, Router,
};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::debug::{debug_page, get_status};
use crate::http::request::{propagate_request_id, request_id, set_request_id};
use crate::http::response::GatewayError;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{ArgumentError, BodyKind, CallArgs, Endpoint, OperationId, ENDPOINTS};
use crate::upstream::{CallError, UpstreamClient, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<UpstreamClient>,
}

/// An endpoint row whose verb the router cannot serve.
#[derive(Debug, Error)]
#[error("operation {operation} uses unsupported method {method}")]
pub struct UnsupportedMethod {
    pub operation: OperationId,
    pub method: Method,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a server forwarding through `client`.
    pub fn new(config: &GatewayConfig, client: Arc<UpstreamClient>) -> Result<Self, UnsupportedMethod> {
        let state = AppState { client };
        let router = Self::build_router(config, state)?;
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Result<Router, UnsupportedMethod> {
        // Several operations share a local path; their methods merge into one MethodRouter.
        let mut routes: BTreeMap<&'static str, (MethodRouter<AppState>, Vec<Method>)> = BTreeMap::new();
        for endpoint in ENDPOINTS {
            let (methods, mut verbs) = routes
                .remove(endpoint.local_path)
                .unwrap_or_else(|| (MethodRouter::new(), Vec::new()));
            let methods = bind(methods, endpoint, PathArgs::Captured)?;
            verbs.push(endpoint.method.clone());
            routes.insert(endpoint.local_path, (methods, verbs));
        }

        // A literal route shadows any template of the same shape, so it also
        // answers the template's remaining verbs (`GET /users/login` is get_user).
        let literals: Vec<&'static str> = routes.keys().copied().filter(|p| !p.contains('{')).collect();
        for path in literals {
            for endpoint in ENDPOINTS.iter().filter(|e| e.has_path_params()) {
                let Some(captured) = endpoint.match_local(path) else {
                    continue;
                };
                let Some((methods, mut verbs)) = routes.remove(path) else {
                    continue;
                };
                let methods = if verbs.contains(&endpoint.method) {
                    methods
                } else {
                    verbs.push(endpoint.method.clone());
                    bind(methods, endpoint, PathArgs::Fixed(captured))?
                };
                routes.insert(path, (methods, verbs));
            }
        }

        let mut router = Router::new()
            .route("/status", get(get_status))
            .route("/debug", get(debug_page));
        for (path, (methods, _)) in routes {
            router = router.route(path, methods);
        }

        Ok(router
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(propagate_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id()))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            operations = ENDPOINTS.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Where a route's path identifiers come from.
enum PathArgs {
    /// Extracted from the matched template.
    Captured,
    /// Fixed by a literal route standing in for the template.
    Fixed(HashMap<String, String>),
}

/// Register `endpoint` on `methods` under its verb.
fn bind(
    methods: MethodRouter<AppState>,
    endpoint: &'static Endpoint,
    path: PathArgs,
) -> Result<MethodRouter<AppState>, UnsupportedMethod> {
    let filter = MethodFilter::try_from(endpoint.method.clone()).map_err(|_| UnsupportedMethod {
        operation: endpoint.id,
        method: endpoint.method.clone(),
    })?;

    let methods = match path {
        PathArgs::Captured if endpoint.has_path_params() => methods.on(
            filter,
            move |State(state): State<AppState>,
                  headers: HeaderMap,
                  Path(path): Path<HashMap<String, String>>,
                  Query(query): Query<HashMap<String, String>>,
                  body: Bytes| dispatch(state, endpoint, headers, path, query, body),
        ),
        PathArgs::Captured => methods.on(
            filter,
            move |State(state): State<AppState>,
                  headers: HeaderMap,
                  Query(query): Query<HashMap<String, String>>,
                  body: Bytes| dispatch(state, endpoint, headers, HashMap::new(), query, body),
        ),
        PathArgs::Fixed(path) => methods.on(
            filter,
            move |State(state): State<AppState>,
                  headers: HeaderMap,
                  Query(query): Query<HashMap<String, String>>,
                  body: Bytes| dispatch(state, endpoint, headers, path.clone(), query, body),
        ),
    };
    Ok(methods)
}

/// The one handler behind every table route.
async fn dispatch(
    state: AppState,
    endpoint: &'static Endpoint,
    headers: HeaderMap,
    path: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let operation = endpoint.id;
    let request_id = request_id(&headers);

    tracing::debug!(
        request_id = %request_id,
        operation = %operation,
        "Dispatching request"
    );

    let result = match bind_args(endpoint, path, query, &body) {
        Ok(args) => forward(state.client.clone(), operation, args).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(value) => {
            tracing::info!(
                request_id = %request_id,
                operation = %operation,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Request forwarded"
            );
            metrics::record_request(operation.name(), StatusCode::OK.as_u16(), started);
            (StatusCode::OK, Json(value)).into_response()
        }
        Err(source) => {
            let err = GatewayError::new(operation, source);
            let status = err.status();
            tracing::warn!(
                request_id = %request_id,
                operation = %operation,
                status = status.as_u16(),
                error = %err.source,
                "Request failed"
            );
            metrics::record_request(operation.name(), status.as_u16(), started);
            err.into_response()
        }
    }
}

/// Run the upstream call on its own task. Dropping the local request future
/// leaves the outbound call running to completion.
async fn forward(
    client: Arc<UpstreamClient>,
    operation: OperationId,
    args: CallArgs,
) -> Result<Value, CallError> {
    match tokio::spawn(async move { client.call(operation, args).await }).await {
        Ok(result) => result,
        Err(e) => Err(UpstreamError::new(format!("upstream call aborted: {e}")).into()),
    }
}

/// Local request parts → call arguments. Query keys the operation does not
/// declare are dropped. Bodies are read only where the operation takes one.
fn bind_args(
    endpoint: &Endpoint,
    path: HashMap<String, String>,
    mut query: HashMap<String, String>,
    body: &Bytes,
) -> Result<CallArgs, ArgumentError> {
    query.retain(|name, _| {
        let declared = endpoint.param(name).is_some();
        if !declared {
            tracing::debug!(operation = %endpoint.id, param = %name, "Ignoring undeclared query parameter");
        }
        declared
    });

    let args = CallArgs::from_request(path, query);
    match endpoint.body {
        BodyKind::None => Ok(args),
        BodyKind::Json => {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Err(ArgumentError::MissingBody);
            }
            let value: Value = serde_json::from_slice(body)
                .map_err(|e| ArgumentError::MalformedBody(e.to_string()))?;
            Ok(args.body(value))
        }
    }
}
