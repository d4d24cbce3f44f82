//! Relay stream with simultaneous capture.
//!
//! Wraps the upstream body stream. Every chunk handed to the client is also
//! appended to a capture buffer; when the stream ends, fails or is dropped
//! the completion callback receives the captured bytes exactly once.
//!
//! Relay memory is bounded by the chunk size. Capture memory grows with the
//! body.

use bytes::{Bytes, BytesMut};
use futures_util::{ready, Stream, StreamExt};
use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// How a relayed body ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// Upstream closed the body normally.
    Complete,
    /// Upstream failed mid-body; the client got a truncated body.
    UpstreamFailed(String),
    /// The client went away before the body finished.
    ClientGone,
}

impl fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEnd::Complete => write!(f, "complete"),
            StreamEnd::UpstreamFailed(e) => write!(f, "upstream failed: {}", e),
            StreamEnd::ClientGone => write!(f, "client disconnected"),
        }
    }
}

type OnComplete = Box<dyn FnOnce(Bytes, StreamEnd) + Send + 'static>;

/// Client-facing body stream that records what it relays.
pub struct CaptureStream<S> {
    /// `None` once upstream is finished or released.
    upstream: Option<S>,
    pending: Bytes,
    captured: BytesMut,
    chunk_size: usize,
    on_complete: Option<OnComplete>,
}

impl<S> CaptureStream<S> {
    pub fn new<F>(upstream: S, chunk_size: usize, on_complete: F) -> Self
    where
        F: FnOnce(Bytes, StreamEnd) + Send + 'static,
    {
        Self {
            upstream: Some(upstream),
            pending: Bytes::new(),
            captured: BytesMut::new(),
            chunk_size: chunk_size.max(1),
            on_complete: Some(Box::new(on_complete)),
        }
    }

    fn finish(&mut self, end: StreamEnd) {
        // release the upstream connection before handing off the capture
        self.upstream = None;
        self.pending = Bytes::new();
        if let Some(on_complete) = self.on_complete.take() {
            let captured = std::mem::take(&mut self.captured).freeze();
            on_complete(captured, end);
        }
    }
}

impl<S, E> Stream for CaptureStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if !this.pending.is_empty() {
                let take = this.pending.len().min(this.chunk_size);
                let chunk = this.pending.split_to(take);
                this.captured.extend_from_slice(&chunk);
                return Poll::Ready(Some(Ok(chunk)));
            }

            let Some(upstream) = this.upstream.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(upstream.poll_next_unpin(cx)) {
                Some(Ok(bytes)) => this.pending = bytes,
                Some(Err(e)) => {
                    tracing::warn!(
                        error = %e,
                        relayed_bytes = this.captured.len(),
                        "Upstream failed mid-stream, truncating response"
                    );
                    this.finish(StreamEnd::UpstreamFailed(e.to_string()));
                    return Poll::Ready(None);
                }
                None => {
                    this.finish(StreamEnd::Complete);
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl<S> Drop for CaptureStream<S> {
    fn drop(&mut self) {
        if self.on_complete.is_some() {
            tracing::warn!(
                relayed_bytes = self.captured.len(),
                "Client went away mid-stream, releasing upstream"
            );
            self.finish(StreamEnd::ClientGone);
        }
    }
}
