//! Body capture for the request logger.
//!
//! # Responsibilities
//! - Read the request body once, up to the capture limit, and hand the same
//!   bytes on to the handler
//! - Forward every response frame unchanged while keeping a bounded copy
//! - Emit the request's `LogEntry` once the response body finishes
//!
//! # Design Decisions
//! - Request: bounded read-ahead; anything past the limit is streamed on
//!   behind the bytes already read, never dropped
//! - Response: a tee, so bytes reach the client in arrival order
//! - Emission happens exactly once: end-of-stream, error frame, or drop
//! - A copy cut short by an error or an early drop is flagged `incomplete`

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use futures_util::{stream, StreamExt};
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::BodyExt;
use pin_project_lite::pin_project;
use serde_json::Value;

use crate::http::record::{parse_json, BodyValue, LogEntry, RequestRecord, ResponseRecord};
use crate::observability::sink::LogSink;

/// Request body after the read-ahead.
pub struct BufferedRequest {
    /// Body to pass downstream; yields exactly the original bytes.
    pub body: Body,

    /// Parsed body, when it was read in full and is JSON.
    pub json: Option<Value>,
}

/// Read up to `limit` bytes of `body`. A body that ends within the limit is
/// parsed and replayed from memory. Otherwise the bytes already read are
/// replayed ahead of the rest of the stream and no JSON is reported.
pub async fn buffer_request(body: Body, limit: usize) -> BufferedRequest {
    if body.size_hint().lower() > limit as u64 {
        return BufferedRequest { body, json: None };
    }

    let mut body = body;
    let mut buf = BytesMut::new();
    loop {
        match body.frame().await {
            None => {
                let bytes = buf.freeze();
                let json = parse_json(&bytes);
                return BufferedRequest {
                    body: Body::from(bytes),
                    json,
                };
            }
            Some(Ok(frame)) => {
                // Request trailers are not forwarded.
                if let Ok(data) = frame.into_data() {
                    buf.extend_from_slice(&data);
                    if buf.len() > limit {
                        let head = stream::once(async move { Ok(buf.freeze()) });
                        let rest = body.into_data_stream();
                        return BufferedRequest {
                            body: Body::from_stream(head.chain(rest)),
                            json: None,
                        };
                    }
                }
            }
            Some(Err(err)) => {
                tracing::warn!(target: "request_logger", error = %err, "request body read failed");
                let replay: Vec<Result<Bytes, axum::Error>> = vec![Ok(buf.freeze()), Err(err)];
                return BufferedRequest {
                    body: Body::from_stream(stream::iter(replay)),
                    json: None,
                };
            }
        }
    }
}

/// Bounded accumulator for the response copy.
#[derive(Debug)]
pub struct Capture {
    buf: BytesMut,
    limit: usize,
    truncated: bool,
    complete: bool,
}

impl Capture {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            limit,
            truncated: false,
            complete: false,
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.buf.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    fn finish(&mut self) {
        self.complete = true;
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// True once the underlying body reported end-of-stream.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Everything needed to build the `LogEntry` except the response body.
pub struct PendingEntry {
    pub request: RequestRecord,
    pub status: StatusCode,
    pub elapsed: Duration,
    pub capture_body: bool,
}

/// Response copy plus the entry it completes. Emits on finish or drop.
struct Emitter {
    pending: Option<PendingEntry>,
    capture: Capture,
    sink: Arc<dyn LogSink>,
}

impl Emitter {
    fn emit(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let body = pending
            .capture_body
            .then(|| BodyValue::from_bytes(self.capture.bytes()));
        let response = ResponseRecord::new(pending.status, pending.elapsed, body)
            .truncated(self.capture.is_truncated())
            .incomplete(!self.capture.is_complete());

        self.sink.record(&LogEntry {
            request: pending.request,
            response,
        });
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        self.emit();
    }
}

pin_project! {
    /// Response body wrapper: streams the original bytes to the client and
    /// logs the request once the stream ends.
    pub struct ResponseTee<B> {
        #[pin]
        inner: B,
        emitter: Emitter,
    }
}

impl<B> ResponseTee<B>
where
    B: HttpBody<Data = Bytes>,
{
    pub fn new(inner: B, pending: PendingEntry, limit: usize, sink: Arc<dyn LogSink>) -> Self {
        let mut capture = Capture::new(limit);
        if inner.is_end_stream() {
            capture.finish();
        }

        Self {
            inner,
            emitter: Emitter {
                pending: Some(pending),
                capture,
                sink,
            },
        }
    }
}

impl<B> HttpBody for ResponseTee<B>
where
    B: HttpBody<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        let polled = this.inner.as_mut().poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    if this.emitter.pending.as_ref().is_some_and(|p| p.capture_body) {
                        this.emitter.capture.push(data);
                    }
                }
                // The transport may stop polling once the body says it is done.
                if this.inner.is_end_stream() {
                    this.emitter.capture.finish();
                    this.emitter.emit();
                }
            }
            Poll::Ready(Some(Err(_))) => {
                tracing::warn!(target: "request_logger", "response body stream failed");
                this.emitter.emit();
            }
            Poll::Ready(None) => {
                this.emitter.capture.finish();
                this.emitter.emit();
            }
            Poll::Pending => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
