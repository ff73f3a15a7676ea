//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the application handlers
//! - Wire up middleware (request logger, timeout, panic recovery)
//! - Bind server to listener with client address info
//! - Graceful shutdown on signal or coordinator trigger

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use crate::config::AppConfig;
use crate::http::handlers;
use crate::http::middleware::RequestLoggerLayer;
use crate::lifecycle::shutdown_signal;
use crate::observability::sink::{LogSink, TracingSink};

/// Build the application with the default `tracing` sink.
pub fn build_app(config: &AppConfig) -> Router {
    build_app_with_sink(config, Arc::new(TracingSink))
}

/// Build the application, logging requests to `sink`.
///
/// Layer order, outermost first: panic recovery, request logger, timeout.
/// The logger sees timeouts as ordinary 408 responses and reports panics
/// before the recovery layer turns them into 500s.
pub fn build_app_with_sink(config: &AppConfig, sink: Arc<dyn LogSink>) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/items", get(handlers::get_item))
        .route("/echo", post(handlers::echo))
        .route("/text", get(handlers::text));

    if config.app.debug {
        router = router.route("/fail", get(handlers::fail));
    }

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.timeouts.request_secs),
        ))
        .layer(RequestLoggerLayer::with_sink(config.capture.clone(), sink))
        .layer(CatchPanicLayer::new())
}

/// HTTP server hosting the logged application.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(config: AppConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: AppConfig, sink: Arc<dyn LogSink>) -> Self {
        let router = build_app_with_sink(&config, sink);
        Self { router, config }
    }

    /// Run the server, accepting connections on the given listener until a
    /// shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            title = %self.config.app.title,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {},
                    _ = shutdown_signal() => {},
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
