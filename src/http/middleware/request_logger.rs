//! Request logging middleware.
//!
//! Wraps the downstream service and emits one `LogEntry` per request/response
//! cycle. The request body is read ahead (bounded) and replayed to the
//! handler; the response body is observed through a tee. The handler and the
//! client see exactly the bytes they would see without it.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::Body,
    http::{Request, Response},
};
use futures_util::FutureExt;
use tower::{Layer, Service};

use crate::config::CaptureConfig;
use crate::http::body::{buffer_request, PendingEntry, ResponseTee};
use crate::http::record::{HandlerFailure, RequestRecord};
use crate::observability::sink::{LogSink, TracingSink};

/// Layer that installs [`RequestLoggerService`].
#[derive(Clone)]
pub struct RequestLoggerLayer {
    config: CaptureConfig,
    sink: Arc<dyn LogSink>,
}

impl RequestLoggerLayer {
    /// Log through `tracing`.
    pub fn new(config: CaptureConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: CaptureConfig, sink: Arc<dyn LogSink>) -> Self {
        Self { config, sink }
    }
}

impl<S> Layer<S> for RequestLoggerLayer {
    type Service = RequestLoggerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggerService {
            inner,
            config: self.config.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Middleware that logs every request passing through it.
#[derive(Clone)]
pub struct RequestLoggerService<S> {
    inner: S,
    config: CaptureConfig,
    sink: Arc<dyn LogSink>,
}

impl<S> Service<Request<Body>> for RequestLoggerService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let start = Instant::now();
        let mut record = RequestRecord::from_request(&request);
        let method = request.method().clone();

        // Use the instance that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = self.config.clone();
        let sink = Arc::clone(&self.sink);

        Box::pin(async move {
            let request = if config.request_body {
                let (parts, body) = request.into_parts();
                let buffered = buffer_request(body, config.max_body_bytes).await;
                record.body = buffered.json;
                Request::from_parts(parts, buffered.body)
            } else {
                request
            };

            let result = AssertUnwindSafe(inner.call(request)).catch_unwind().await;
            let elapsed = start.elapsed();

            let response = match result {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => {
                    sink.handler_failed(&HandlerFailure::new(&method, record.path, err.to_string()));
                    return Err(err);
                }
                Err(panic) => {
                    sink.handler_failed(&HandlerFailure::new(
                        &method,
                        record.path,
                        panic_reason(panic.as_ref()),
                    ));
                    std::panic::resume_unwind(panic);
                }
            };

            let pending = PendingEntry {
                request: record,
                status: response.status(),
                elapsed,
                capture_body: config.response_body,
            };

            Ok(response.map(|body| {
                Body::new(ResponseTee::new(body, pending, config.max_body_bytes, sink))
            }))
        })
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
