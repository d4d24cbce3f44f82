//! Response construction for the client side.
//!
//! # Responsibilities
//! - Build the streamed relay response (status and headers verbatim)
//! - Build synthetic plain-text responses for proxy-side failures
//!
//! # Design Decisions
//! - Relay bodies have no known length; the server re-frames them
//! - Synthetic bodies are human-readable text, never JSON

use axum::body::Body;
use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures_util::Stream;
use std::convert::Infallible;

/// Streamed response relaying an upstream body.
pub fn relay_response<S>(status: StatusCode, headers: HeaderMap, body: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Plain-text response generated by the proxy itself.
pub fn text_response(status: StatusCode, body: impl Into<String>) -> Response {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
