//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing)
//! - Bind server to listener, shut down gracefully
//! - Normalize path, filter headers, forward, relay, record
//! - Keep the recorder running until in-flight records are flushed

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, State},
    http::{Method, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use chrono::Local;
use http_body_util::LengthLimitError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::http::capture::StreamEnd;
use crate::http::forward::{ForwardingEngine, OutboundRequest};
use crate::http::headers::filter_request_headers;
use crate::http::response::{relay_response, text_response};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::recorder::{
    body_text, header_record, HeaderRecord, PendingTransaction, Recorder, RecorderHandle,
    RecordStore, RequestRecord, ResponseRecord, UNDECODABLE_BODY,
};
use crate::routing::PathNormalizer;

/// Errors that stop the server itself (never per-request failures).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ForwardingEngine>,
    pub normalizer: Arc<PathNormalizer>,
    pub recorder: RecorderHandle,
    pub max_request_body_bytes: usize,
}

/// HTTP server for the recording proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    recorder: Recorder,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let engine = ForwardingEngine::new(&config.upstream)?;
        let (handle, recorder) = Recorder::new(RecordStore::new(&config.recording.log_dir));

        let state = AppState {
            engine: Arc::new(engine),
            normalizer: Arc::new(PathNormalizer::new(config.upstream.base_url.as_str())),
            recorder: handle,
            max_request_body_bytes: config.limits.max_request_body_bytes,
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            recorder,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` fires, then flush pending records.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        let writer = tokio::spawn(self.recorder.run());

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await;

        // Every RecorderHandle lived in the router, which is gone now.
        if let Err(e) = writer.await {
            tracing::error!(error = %e, "Recorder task failed");
        }
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Answer with a proxy-generated error and record it.
fn reject(
    state: &AppState,
    pending: PendingTransaction,
    method: &Method,
    status: StatusCode,
    message: String,
    start_time: Instant,
) -> Response {
    metrics::record_request(method.as_str(), status.as_u16(), start_time);
    state.recorder.submit(pending.complete(ResponseRecord {
        status_code: status.as_u16(),
        headers: HeaderRecord::new(),
        body: message.clone(),
    }));
    text_response(status, message)
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let timestamp = Local::now();
    let request_id = Uuid::new_v4();
    let client_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();

    let (parts, body) = request.into_parts();
    let method = parts.method;
    let url = state
        .normalizer
        .upstream_url(parts.uri.path(), parts.uri.query());
    let filtered = filter_request_headers(&parts.headers);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        url = %url,
        "Proxying request"
    );

    let mut request_record = RequestRecord {
        method: method.to_string(),
        url: url.clone(),
        client_address,
        headers_sent: header_record(&filtered.forwarded),
        headers_removed: header_record(&filtered.removed),
        body: String::new(),
    };

    let body = match to_bytes(body, state.max_request_body_bytes).await {
        Ok(bytes) => {
            request_record.body = body_text(&bytes);
            bytes
        }
        Err(e) => {
            let status = if is_length_limit(&e) {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };
            tracing::warn!(
                request_id = %request_id,
                error = %e,
                status = %status,
                "Request body rejected"
            );
            request_record.body = UNDECODABLE_BODY.to_string();
            let pending = PendingTransaction::started_at(timestamp, start_time, request_record);
            let message = format!("Proxy Error: failed to read request body: {}", e);
            return reject(&state, pending, &method, status, message, start_time);
        }
    };

    let pending = PendingTransaction::started_at(timestamp, start_time, request_record);
    let outbound = OutboundRequest {
        method: method.clone(),
        url,
        headers: filtered.forwarded,
        body,
    };

    match state.engine.forward(outbound).await {
        Ok(upstream) => {
            let status = upstream.status;
            let headers = upstream.headers.clone();
            let recorded_headers = header_record(&headers);
            let recorder = state.recorder.clone();

            metrics::record_request(method.as_str(), status.as_u16(), start_time);
            tracing::debug!(request_id = %request_id, status = %status, "Upstream responded");

            let relay = upstream.into_relay(move |captured, end| {
                if end != StreamEnd::Complete {
                    tracing::debug!(
                        request_id = %request_id,
                        outcome = %end,
                        "Recording partial response"
                    );
                }
                recorder.submit(pending.complete(ResponseRecord {
                    status_code: status.as_u16(),
                    headers: recorded_headers,
                    body: body_text(&captured),
                }));
            });
            relay_response(status, headers, relay)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_upstream_error(e.kind());
            let message = format!("Proxy Error: {}", e);
            reject(&state, pending, &method, StatusCode::BAD_GATEWAY, message, start_time)
        }
    }
}
