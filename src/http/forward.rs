//! Upstream forwarding.
//!
//! # Responsibilities
//! - Issue the upstream call with the client's method, headers and body
//! - Never follow redirects; a 3xx is the client's business
//! - Apply connect and read timeouts
//! - Hand back status, relayable headers and a capturing body stream
//!
//! # Design Decisions
//! - Failures before response headers become a `ForwardError` (the caller
//!   answers 502); failures after headers only truncate the relayed body
//! - The client decodes compressed bodies, matching the removal of
//!   `content-encoding` from relayed headers

use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::http::capture::{CaptureStream, StreamEnd};
use crate::http::headers::filter_response_headers;

/// Upstream body as produced by the HTTP client.
pub type UpstreamBody = BoxStream<'static, Result<Bytes, reqwest::Error>>;

/// Upstream failed before any response bytes arrived.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream timed out: {0}")]
    TimedOut(reqwest::Error),

    #[error("upstream unreachable: {0}")]
    Unreachable(reqwest::Error),
}

impl ForwardError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::TimedOut(_) => "timeout",
            ForwardError::Unreachable(_) => "unreachable",
        }
    }
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ForwardError::TimedOut(e)
        } else {
            ForwardError::Unreachable(e)
        }
    }
}

/// Request as it leaves for the upstream.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Upstream response whose body has not been read yet.
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Already filtered for relay.
    pub headers: HeaderMap,
    body: UpstreamBody,
    chunk_size: usize,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl UpstreamResponse {
    /// Turn the body into the client-facing relay. `on_complete` runs exactly
    /// once with everything relayed, whether the body finished, failed or
    /// was abandoned by the client.
    pub fn into_relay<F>(self, on_complete: F) -> CaptureStream<UpstreamBody>
    where
        F: FnOnce(Bytes, StreamEnd) + Send + 'static,
    {
        CaptureStream::new(self.body, self.chunk_size, on_complete)
    }
}

/// Issues upstream calls. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ForwardingEngine {
    client: reqwest::Client,
    chunk_size: usize,
}

impl ForwardingEngine {
    /// Build the upstream client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            chunk_size: config.chunk_size,
        })
    }

    /// Send the request and wait for response headers.
    pub async fn forward(
        &self,
        request: OutboundRequest,
    ) -> Result<UpstreamResponse, ForwardError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = filter_response_headers(response.headers());

        Ok(UpstreamResponse {
            status,
            headers,
            body: response.bytes_stream().boxed(),
            chunk_size: self.chunk_size,
        })
    }
}
